use caline3_core::core_types::PartsPerMillion;
use caline3_core::{compute_meteo, summarize, ConcentrationMatrix, Meteo, ReportConfig, RunConfig};

use crate::error::{Caline3ErrorCode, DefaultCaline3Error};
use crate::helpers::{buffer_from_ptr, job_from_ptr, track_error, track_result};
use crate::instance::Caline3Job;

impl Caline3Job {
    fn meteo(&self, index: usize) -> Result<&Meteo, DefaultCaline3Error> {
        let meteos = self.job.meteos();
        meteos
            .get(index)
            .ok_or_else(|| DefaultCaline3Error::index_out_of_range("meteorology", index, meteos.len()))
    }

    fn compute(&self, index: usize) -> Result<(&Meteo, ConcentrationMatrix), DefaultCaline3Error> {
        let meteo = self.meteo(index)?;
        let matrix = compute_meteo(&self.job, meteo, &RunConfig::default())?;
        Ok((meteo, matrix))
    }
}

/// Check that a caller buffer can hold `required` values.
fn check_capacity(required: usize, capacity: usize) -> Result<(), DefaultCaline3Error> {
    if capacity < required {
        return Err(DefaultCaline3Error::buffer_too_small(required, capacity));
    }
    Ok(())
}

/// Number of receptors, links and meteorological scenarios in a job.
///
/// Returns
/// - `Caline3ErrorCode::Ok` (0) - all three out-parameters written
/// - `Caline3ErrorCode::NullPointer` - `job` or any out-parameter is null
///
/// # Safety
/// - `job` must be null or a live pointer returned by `caline3_job_parse`.
/// - Out-parameters must be null or valid for writes.
#[no_mangle]
pub unsafe extern "C" fn caline3_job_counts(
    job: *const Caline3Job,
    out_receptors: *mut usize,
    out_links: *mut usize,
    out_meteos: *mut usize,
) -> Caline3ErrorCode {
    if out_receptors.is_null() || out_links.is_null() || out_meteos.is_null() {
        return track_error(&DefaultCaline3Error::null_pointer("out_receptors/out_links/out_meteos"));
    }

    // SAFETY: `job` is null or valid per the documented contract.
    match track_result(unsafe { job_from_ptr(job) }) {
        Ok(instance) => {
            // SAFETY: all out-parameters were checked for null above.
            unsafe {
                *out_receptors = instance.job.receptors().len();
                *out_links = instance.job.links().len();
                *out_meteos = instance.job.meteos().len();
            }
            Caline3ErrorCode::Ok
        }
        Err(code) => code,
    }
}

/// Concentration of every link at every receptor for one meteorological
/// scenario, in micrograms per cubic meter.
///
/// Values are written link-major: `out_values[l * receptor_count + r]` is
/// the contribution of link `l` at receptor `r`. Ambient concentration is not
/// included.
///
/// Parameters
/// - `job`: Job returned by `caline3_job_parse`.
/// - `meteo_index`: Zero-based scenario index.
/// - `out_values`: Buffer of at least `link_count * receptor_count` doubles.
/// - `capacity`: Number of doubles `out_values` can hold.
///
/// Returns
/// - `Caline3ErrorCode::Ok` (0) - values written
/// - `Caline3ErrorCode::NullPointer` - `job` or `out_values` is null
/// - `Caline3ErrorCode::IndexOutOfRange` - no scenario at `meteo_index`
/// - `Caline3ErrorCode::BufferTooSmall` - `capacity` below the value count
/// - `Caline3ErrorCode::DegenerateCalibration` - a link's dispersion curves cannot be fitted
///
/// # Safety
/// - `job` must be null or a live pointer returned by `caline3_job_parse`.
/// - `out_values` must be null or valid for writes of `capacity` doubles.
#[no_mangle]
pub unsafe extern "C" fn caline3_compute_meteo(
    job: *const Caline3Job,
    meteo_index: usize,
    out_values: *mut f64,
    capacity: usize,
) -> Caline3ErrorCode {
    // SAFETY: pointer contracts are forwarded to the caller.
    let result = unsafe { job_from_ptr(job) }.and_then(|instance| {
        let required = instance.job.links().len() * instance.job.receptors().len();
        check_capacity(required, capacity)?;
        // SAFETY: `out_values` is valid for `capacity >= required` writes.
        let buffer = unsafe { buffer_from_ptr(out_values, required, "out_values") }?;
        let (_, matrix) = instance.compute(meteo_index)?;
        for (slot, value) in buffer.iter_mut().zip(matrix.values()) {
            *slot = **value;
        }
        Ok(())
    });

    match track_result(result) {
        Ok(()) => Caline3ErrorCode::Ok,
        Err(code) => code,
    }
}

/// Reported total at every receptor for one meteorological scenario, in ppm.
///
/// Each total is the sum of all link contributions converted with the given
/// molecular weight, plus the scenario's ambient concentration, rounded to
/// `digits` decimals exactly as in the text report.
///
/// Parameters
/// - `job`: Job returned by `caline3_job_parse`.
/// - `meteo_index`: Zero-based scenario index.
/// - `molecular_weight`: Pollutant molecular weight [g/mol], 28 for CO.
/// - `digits`: Decimal digits kept, at most 15.
/// - `out_totals`: Buffer of at least `receptor_count` doubles.
/// - `capacity`: Number of doubles `out_totals` can hold.
///
/// Returns
/// - `Caline3ErrorCode::Ok` (0) - totals written
/// - `Caline3ErrorCode::NullPointer` - `job` or `out_totals` is null
/// - `Caline3ErrorCode::InvalidParameter` - `molecular_weight` is not positive or `digits` exceeds 15
/// - `Caline3ErrorCode::IndexOutOfRange` - no scenario at `meteo_index`
/// - `Caline3ErrorCode::BufferTooSmall` - `capacity` below the receptor count
/// - `Caline3ErrorCode::DegenerateCalibration` - a link's dispersion curves cannot be fitted
///
/// # Safety
/// - `job` must be null or a live pointer returned by `caline3_job_parse`.
/// - `out_totals` must be null or valid for writes of `capacity` doubles.
#[no_mangle]
pub unsafe extern "C" fn caline3_receptor_totals_ppm(
    job: *const Caline3Job,
    meteo_index: usize,
    molecular_weight: f64,
    digits: u32,
    out_totals: *mut f64,
    capacity: usize,
) -> Caline3ErrorCode {
    // SAFETY: pointer contracts are forwarded to the caller.
    let result = unsafe { job_from_ptr(job) }.and_then(|instance| {
        if !(molecular_weight.is_finite() && molecular_weight > 0.0) {
            return Err(DefaultCaline3Error::invalid_parameter(format!(
                "Molecular weight must be positive, got {molecular_weight}"
            )));
        }
        if digits > PartsPerMillion::MAX_DIGITS {
            return Err(DefaultCaline3Error::invalid_parameter(format!(
                "Digits must be at most {}, got {digits}",
                PartsPerMillion::MAX_DIGITS
            )));
        }
        let required = instance.job.receptors().len();
        check_capacity(required, capacity)?;
        // SAFETY: `out_totals` is valid for `capacity >= required` writes.
        let buffer = unsafe { buffer_from_ptr(out_totals, required, "out_totals") }?;

        let (meteo, matrix) = instance.compute(meteo_index)?;
        let config = ReportConfig {
            molecular_weight,
            digits,
        };
        let report = summarize(&instance.job, meteo, &matrix, &config);
        for (slot, receptor) in buffer.iter_mut().zip(&report.receptors) {
            *slot = *receptor.total;
        }
        Ok(())
    });

    match track_result(result) {
        Ok(()) => Caline3ErrorCode::Ok,
        Err(code) => code,
    }
}
