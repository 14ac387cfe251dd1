//! Practical salinity (PSS-78) from conductivity, temperature and pressure.
//!
//! Follows the TEOS-10 `SP_from_C` algorithm: the PSS-78 polynomial fit,
//! extended below SP = 2 with the Hill et al. (1986) correction so that the
//! result goes to zero with conductivity.

use tracing::debug;

use crate::error::{AnalysisError, Result};
use crate::types::{PairedObservation, Reading, TimeSeries};

const US_PER_MS: f64 = 1000.0;

/// C(SP = 35, t68 = 15 °C, p = 0) in mS/cm (Culkin and Smith, 1980).
const C3515_MS_CM: f64 = 42.914;
const T68_PER_T90: f64 = 1.00024;

const A: [f64; 6] = [0.0080, -0.1692, 25.3851, 14.0941, -7.0261, 2.7081];
const B: [f64; 6] = [0.0005, -0.0056, -0.0066, -0.0375, 0.0636, -0.0144];
const C: [f64; 5] = [
    0.676_609_7,
    2.005_64e-2,
    1.104_259e-4,
    -6.9698e-7,
    1.0031e-9,
];
const D: [f64; 4] = [3.426e-2, 4.464e-4, 4.215e-1, -3.107e-3];
const E: [f64; 3] = [2.070e-5, -6.370e-10, 3.989e-15];
const K: f64 = 0.0162;

/// Practical salinity from conductivity in µS/cm, temperature in °C (ITS-90)
/// and sea pressure in dbar.
///
/// Returns `None` for non-finite inputs, negative conductivity or pressure,
/// and inputs whose conductivity ratio falls below zero.
pub fn salinity(conductivity_us_cm: f64, temperature_c: f64, pressure_dbar: f64) -> Option<f64> {
    if !conductivity_us_cm.is_finite() || !temperature_c.is_finite() || !pressure_dbar.is_finite()
    {
        return None;
    }
    if conductivity_us_cm < 0.0 || pressure_dbar < 0.0 {
        return None;
    }

    let c = conductivity_us_cm / US_PER_MS;
    let p = pressure_dbar;
    let t68 = temperature_c * T68_PER_T90;
    let ft68 = (t68 - 15.0) / (1.0 + K * (t68 - 15.0));

    let r = c / C3515_MS_CM;
    let rt_lc = C[0] + (C[1] + (C[2] + (C[3] + C[4] * t68) * t68) * t68) * t68;
    let rp = 1.0
        + (p * (E[0] + E[1] * p + E[2] * p * p))
            / (1.0 + D[0] * t68 + D[1] * t68 * t68 + (D[2] + D[3] * t68) * r);
    let rt = r / (rp * rt_lc);
    if !rt.is_finite() || rt < 0.0 {
        return None;
    }

    let rtx = rt.sqrt();
    let mut sp = pss78_polynomial(rtx, ft68);

    if sp < 2.0 {
        let x = 400.0 * rt;
        let sqrty = 10.0 * rtx;
        let part1 = 1.0 + x * (1.5 + x);
        let part2 = 1.0 + sqrty * (1.0 + sqrty * (1.0 + sqrty));
        let sp_hill_raw = sp - A[0] / part1 - B[0] * ft68 / part2;
        sp = hill_ratio_at_sp2(temperature_c) * sp_hill_raw;
    }

    if sp.is_finite() {
        Some(sp.max(0.0))
    } else {
        None
    }
}

fn pss78_polynomial(rtx: f64, ft68: f64) -> f64 {
    A[0] + (A[1] + (A[2] + (A[3] + (A[4] + A[5] * rtx) * rtx) * rtx) * rtx) * rtx
        + ft68 * (B[0] + (B[1] + (B[2] + (B[3] + (B[4] + B[5] * rtx) * rtx) * rtx) * rtx) * rtx)
}

fn pss78_derivative(rtx: f64, ft68: f64) -> f64 {
    A[1] + (2.0 * A[2] + (3.0 * A[3] + (4.0 * A[4] + 5.0 * A[5] * rtx) * rtx) * rtx) * rtx
        + ft68
            * (B[1] + (2.0 * B[2] + (3.0 * B[3] + (4.0 * B[4] + 5.0 * B[5] * rtx) * rtx) * rtx) * rtx)
}

/// Ratio between the Hill et al. (1986) salinity and PSS-78 at SP = 2, used
/// to make the low-salinity extension continuous with PSS-78.
fn hill_ratio_at_sp2(temperature_c: f64) -> f64 {
    const G: [f64; 10] = [
        2.641_463_563_366_498e-1,
        2.007_883_247_811_176e-4,
        -4.107_694_432_853_053e-6,
        8.401_670_882_091_225e-8,
        -1.711_392_021_989_210e-9,
        3.374_193_893_377_380e-11,
        -5.923_731_174_730_784e-13,
        8.057_771_569_962_299e-15,
        -7.054_313_817_447_962e-17,
        2.859_992_717_347_235e-19,
    ];
    const SP2: f64 = 2.0;

    let t68 = temperature_c * T68_PER_T90;
    let ft68 = (t68 - 15.0) / (1.0 + K * (t68 - 15.0));

    let rtx0 = G.iter().rev().fold(0.0, |acc, g| acc * t68 + g);

    // One modified Newton-Raphson step (McDougall and Wotherspoon, 2013).
    let sp_est = pss78_polynomial(rtx0, ft68);
    let dsp_drtx = pss78_derivative(rtx0, ft68);
    let rtx = rtx0 - (sp_est - SP2) / dsp_drtx;
    let rtxm = 0.5 * (rtx + rtx0);
    let dsp_drtx = pss78_derivative(rtxm, ft68);
    let rtx = rtx0 - (sp_est - SP2) / dsp_drtx;

    let x = 400.0 * rtx * rtx;
    let sqrty = 10.0 * rtx;
    let part1 = 1.0 + x * (1.5 + x);
    let part2 = 1.0 + sqrty * (1.0 + sqrty * (1.0 + sqrty));
    let sp_hill_raw_at_sp2 = SP2 - A[0] / part1 - B[0] * ft68 / part2;

    SP2 / sp_hill_raw_at_sp2
}

/// Elementwise [`salinity`] over equal-length slices.
pub fn salinity_series(
    conductivity_us_cm: &[f64],
    temperature_c: &[f64],
    pressure_dbar: &[f64],
) -> Result<Vec<Option<f64>>> {
    if conductivity_us_cm.len() != temperature_c.len()
        || conductivity_us_cm.len() != pressure_dbar.len()
    {
        return Err(AnalysisError::LengthMismatch(format!(
            "conductivity has {}, temperature {}, pressure {} values",
            conductivity_us_cm.len(),
            temperature_c.len(),
            pressure_dbar.len()
        )));
    }

    Ok(conductivity_us_cm
        .iter()
        .zip(temperature_c)
        .zip(pressure_dbar)
        .map(|((c, t), p)| salinity(*c, *t, *p))
        .collect())
}

/// Salinity series derived from paired observations.
#[derive(Debug, Clone)]
pub struct Conversion {
    pub series: TimeSeries,
    /// Observations whose salinity came out missing.
    pub unconverted: usize,
}

pub fn convert_observations(
    name: impl Into<String>,
    observations: &[PairedObservation],
) -> Conversion {
    let mut readings = Vec::with_capacity(observations.len());
    let mut unconverted = 0;

    for obs in observations {
        match salinity(obs.conductivity_us_cm, obs.temperature_c, obs.pressure_dbar) {
            Some(value) => readings.push(Reading::new(obs.timestamp, value)),
            None => unconverted += 1,
        }
    }

    let series = TimeSeries::new(name, readings);
    debug!(
        series = series.name(),
        converted = series.len(),
        unconverted,
        "converted conductivity to practical salinity"
    );

    Conversion {
        series,
        unconverted,
    }
}
