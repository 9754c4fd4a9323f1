//! Static catalog of CFS2 and CMIP6 variables.
//!
//! Ported verbatim from the upstream Python `const.py` tables: forecast/
//! reanalysis GRIB2 band numbers, the daily reducer applied when collapsing
//! four 6-hourly reanalysis values into one day, and bilingual display
//! labels. `TMIN` deliberately reuses `TMAX`'s reanalysis band (601) — see
//! the module-level note on that entry.

use std::fmt;

/// How four 6-hourly reanalysis slices are collapsed into one daily value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reducer {
    Mean,
    Sum,
    Min,
    Max,
}

impl Reducer {
    /// Reduce a day's worth of values, ignoring NaNs the way `numpy`'s
    /// `mean`/`sum`/`min`/`max` would after a `np.nan_to_num`-free read --
    /// any `NaN` present makes the whole day `NaN`, matching upstream.
    pub fn reduce(&self, values: &[f32]) -> f32 {
        if values.is_empty() || values.iter().any(|v| v.is_nan()) {
            return f32::NAN;
        }
        match self {
            Reducer::Mean => values.iter().sum::<f32>() / values.len() as f32,
            Reducer::Sum => values.iter().sum(),
            Reducer::Min => values.iter().copied().fold(f32::INFINITY, f32::min),
            Reducer::Max => values.iter().copied().fold(f32::NEG_INFINITY, f32::max),
        }
    }
}

/// Which CFS2 forecast product a band is fetched from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cfs2Family {
    Flx,
    Pgb,
}

impl fmt::Display for Cfs2Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cfs2Family::Flx => write!(f, "flx"),
            Cfs2Family::Pgb => write!(f, "pgb"),
        }
    }
}

/// One CFS2 variable: its forecast/reanalysis GRIB2 band numbers, which
/// product it belongs to, the daily reducer, and bilingual labels.
#[derive(Debug, Clone, Copy)]
pub struct Cfs2Band {
    pub name: &'static str,
    pub family: Cfs2Family,
    pub forecast_band: u32,
    pub reanalysis_band: u32,
    pub daily_stat: Reducer,
    pub label_en: &'static str,
    pub label_ru: &'static str,
}

macro_rules! flx {
    ($name:expr, $fc:expr, $re:expr, $stat:expr, $en:expr, $ru:expr) => {
        Cfs2Band {
            name: $name,
            family: Cfs2Family::Flx,
            forecast_band: $fc,
            reanalysis_band: $re,
            daily_stat: $stat,
            label_en: $en,
            label_ru: $ru,
        }
    };
}

/// FLX-product bands, in upstream `CFS2_FLX_BANDS` order.
pub const FLX_BANDS: &[Cfs2Band] = &[
    flx!("DLWRF", 9, 571, Reducer::Mean, "Downward Long-Wave Radiaiton Flux, W/m\u{b2}", "\u{41d}\u{438}\u{441}\u{445}\u{43e}\u{434}\u{44f}\u{449}\u{438}\u{439} \u{43f}\u{43e}\u{442}\u{43e}\u{43a} \u{438}\u{43d}\u{444}\u{440}\u{430}\u{43a}\u{440}\u{430}\u{441}\u{43d}\u{43e}\u{433}\u{43e} \u{438}\u{437}\u{43b}\u{443}\u{447}\u{435}\u{43d}\u{438}\u{44f}, \u{412}\u{442}/\u{43c}\u{b2}"),
    flx!("DSWRF", 12, 576, Reducer::Mean, "Downward Short-Wave Radiation Flux, W/m\u{b2}", "\u{41d}\u{438}\u{441}\u{445}\u{43e}\u{434}\u{44f}\u{449}\u{438}\u{439} \u{43f}\u{43e}\u{442}\u{43e}\u{43a} \u{43a}\u{43e}\u{440}\u{43e}\u{442}\u{43a}\u{43e}\u{432}\u{43e}\u{43b}\u{43d}\u{43e}\u{432}\u{43e}\u{433}\u{43e} \u{441}\u{43e}\u{43b}\u{43d}\u{435}\u{447}\u{43d}\u{43e}\u{433}\u{43e} \u{438}\u{437}\u{43b}\u{443}\u{447}\u{435}\u{43d}\u{438}\u{44f}, \u{412}\u{442}/\u{43c}\u{b2}"),
    flx!("GFLUX", 14, 644, Reducer::Mean, "Ground Heat Flux, W/m\u{b2}", "\u{41f}\u{43e}\u{442}\u{43e}\u{43a} \u{442}\u{435}\u{43f}\u{43b}\u{430} \u{447}\u{435}\u{440}\u{435}\u{437} \u{43f}\u{43e}\u{432}\u{435}\u{440}\u{445}\u{43d}\u{43e}\u{441}\u{442}\u{44c} \u{43f}\u{43e}\u{447}\u{432}\u{44b}, \u{412}\u{442}/\u{43c}\u{b2}"),
    flx!("LHTFL", 2, 564, Reducer::Mean, "Latent Heat Net Flux, W/m\u{b2}", "\u{41f}\u{43e}\u{442}\u{43e}\u{43a} \u{441}\u{43a}\u{440}\u{44b}\u{442}\u{43e}\u{433}\u{43e} \u{442}\u{435}\u{43f}\u{43b}\u{430}, \u{412}\u{442}/\u{43c}\u{b2}"),
    flx!("PRATE", 13, 591, Reducer::Sum, "Precipitation Rate, kg/m\u{b2}/s", "\u{418}\u{43d}\u{442}\u{435}\u{43d}\u{441}\u{438}\u{432}\u{43d}\u{43e}\u{441}\u{442}\u{44c} \u{43e}\u{441}\u{430}\u{434}\u{43a}\u{43e}\u{432}, \u{43a}\u{433}/\u{43c}\u{b2}/\u{441}"),
    flx!("PRES", 19, 600, Reducer::Mean, "Atmospheric Pressure, hPa", "\u{410}\u{442}\u{43c}\u{43e}\u{441}\u{444}\u{435}\u{440}\u{43d}\u{43e}\u{435} \u{434}\u{430}\u{432}\u{43b}\u{435}\u{43d}\u{438}\u{435}, \u{433}\u{41f}\u{430}"),
    flx!("QMAX", 22, 603, Reducer::Max, "Maximum Specific Humidity, kg/kg", "\u{41c}\u{430}\u{43a}\u{441}\u{438}\u{43c}\u{430}\u{43b}\u{44c}\u{43d}\u{430}\u{44f} \u{443}\u{434}\u{435}\u{43b}\u{44c}\u{43d}\u{430}\u{44f} \u{432}\u{43b}\u{430}\u{436}\u{43d}\u{43e}\u{441}\u{442}\u{44c}, \u{43a}\u{433}/\u{43a}\u{433}"),
    flx!("QMIN", 23, 604, Reducer::Min, "Minimum Specific Humidity, kg/kg", "\u{41c}\u{438}\u{43d}\u{438}\u{43c}\u{430}\u{43b}\u{44c}\u{43d}\u{430}\u{44f} \u{443}\u{434}\u{435}\u{43b}\u{44c}\u{43d}\u{430}\u{44f} \u{432}\u{43b}\u{430}\u{436}\u{43d}\u{43e}\u{441}\u{442}\u{44c}, \u{43a}\u{433}/\u{43a}\u{433}"),
    flx!("SHTFL", 1, 563, Reducer::Mean, "Sensible Heat Net Flux, W/m\u{b2}", "\u{421}\u{435}\u{442}\u{435}\u{432}\u{43e}\u{439} \u{43f}\u{43e}\u{442}\u{43e}\u{43a} \u{44f}\u{432}\u{43d}\u{43e}\u{433}\u{43e} \u{442}\u{435}\u{43f}\u{43b}\u{430}, \u{412}\u{442}/\u{43c}\u{b2}"),
    flx!("SNOD", 28, 625, Reducer::Max, "Snow Depth, m", "\u{413}\u{43b}\u{443}\u{431}\u{438}\u{43d}\u{430} \u{441}\u{43d}\u{435}\u{436}\u{43d}\u{43e}\u{433}\u{43e} \u{43f}\u{43e}\u{43a}\u{440}\u{43e}\u{432}\u{430}, \u{43c}"),
    flx!("SOILW_0-0.1m", 4, 566, Reducer::Max, "Volumetric Soil Moisture Content, m\u{b3}/m\u{b3}", "\u{41e}\u{431}\u{44a}\u{435}\u{43c}\u{43d}\u{43e}\u{435} \u{441}\u{43e}\u{434}\u{435}\u{440}\u{436}\u{430}\u{43d}\u{438}\u{435} \u{432}\u{43b}\u{430}\u{433}\u{438} \u{432} \u{43f}\u{43e}\u{447}\u{432}\u{435}, \u{43c}\u{b3}/\u{43c}\u{b3}"),
    flx!("SOILW_0.1-0.4m", 5, 567, Reducer::Max, "", ""),
    flx!("SOILW_0.4-1m", 24, 617, Reducer::Max, "", ""),
    flx!("SOILW_1-2m", 25, 618, Reducer::Max, "", ""),
    flx!("SPFH", 18, 599, Reducer::Mean, "Specific Humidity, kg/kg", "\u{423}\u{434}\u{435}\u{43b}\u{44c}\u{43d}\u{430}\u{44f} \u{432}\u{43b}\u{430}\u{436}\u{43d}\u{43e}\u{441}\u{442}\u{44c}, \u{43a}\u{433}/\u{43a}\u{433}"),
    flx!("TMAX", 20, 601, Reducer::Max, "Maximum Temperature, \u{b0}C", "\u{41c}\u{430}\u{43a}\u{441}\u{438}\u{43c}\u{430}\u{43b}\u{44c}\u{43d}\u{430}\u{44f} \u{442}\u{435}\u{43c}\u{43f}\u{435}\u{440}\u{430}\u{442}\u{443}\u{440}\u{430}, \u{b0}C"),
    // Upstream quirk preserved verbatim: TMIN shares TMAX's reanalysis band
    // (601); the reanalysis archive carries no separate minimum-temperature
    // band, so both daily extremes are derived from the same slice.
    flx!("TMIN", 21, 601, Reducer::Min, "Minimum Temperature, \u{b0}C", "\u{41c}\u{438}\u{43d}\u{438}\u{43c}\u{430}\u{43b}\u{44c}\u{43d}\u{430}\u{44f} \u{442}\u{435}\u{43c}\u{43f}\u{435}\u{440}\u{430}\u{442}\u{443}\u{440}\u{430}, \u{b0}C"),
    flx!("TMP", 17, 598, Reducer::Mean, "Temperature, \u{b0}C", "\u{422}\u{435}\u{43c}\u{43f}\u{435}\u{440}\u{430}\u{442}\u{443}\u{440}\u{430}, \u{b0}C"),
    flx!("TMP_0m", 3, 565, Reducer::Mean, "Soil temperature, \u{b0}C", "\u{422}\u{435}\u{43c}\u{43f}\u{435}\u{440}\u{430}\u{442}\u{443}\u{440}\u{430} \u{43f}\u{43e}\u{447}\u{432}\u{44b}, \u{b0}C"),
    flx!("TMP_0_0.1m", 6, 568, Reducer::Mean, "", ""),
    flx!("TMP_0.1_0.4m", 7, 569, Reducer::Mean, "", ""),
    flx!("TMP_0.4_1m", 26, 619, Reducer::Mean, "", ""),
    flx!("TMP_1-2m", 27, 620, Reducer::Mean, "", ""),
    flx!("UGRD", 15, 596, Reducer::Mean, "U-component of Wind, m/s", "\u{417}\u{43e}\u{43d}\u{430}\u{43b}\u{44c}\u{43d}\u{430}\u{44f} \u{441}\u{43e}\u{441}\u{442}\u{430}\u{432}\u{43b}\u{44f}\u{44e}\u{449}\u{430}\u{44f} \u{432}\u{435}\u{442}\u{440}\u{430}, \u{442}.\u{435}. \u{43a}\u{43e}\u{43c}\u{43f}\u{43e}\u{43d}\u{435}\u{43d}\u{442} \u{432}\u{435}\u{442}\u{440}\u{430} \u{43f}\u{43e} \u{43e}\u{441}\u{438} \u{437}\u{430}\u{43f}\u{430}\u{434}-\u{432}\u{43e}\u{441}\u{442}\u{43e}\u{43a}, \u{43c}/\u{441}"),
    flx!("ULWRF", 10, 572, Reducer::Mean, "Upward Long-Wave Radiation Flux, W/m\u{b2}", "\u{412}\u{43e}\u{441}\u{445}\u{43e}\u{434}\u{44f}\u{449}\u{438}\u{439} \u{43f}\u{43e}\u{442}\u{43e}\u{43a} \u{438}\u{43d}\u{444}\u{440}\u{430}\u{43a}\u{440}\u{430}\u{441}\u{43d}\u{43e}\u{433}\u{43e} \u{438}\u{437}\u{43b}\u{443}\u{447}\u{435}\u{43d}\u{438}\u{44f}, \u{412}\u{442}/\u{43c}\u{b2}"),
    flx!("USWRF", 11, 575, Reducer::Mean, "Upward Short-Wave Radiation Flux, W/m\u{b2}", "\u{412}\u{43e}\u{441}\u{445}\u{43e}\u{434}\u{44f}\u{449}\u{438}\u{439} \u{43f}\u{43e}\u{442}\u{43e}\u{43a} \u{43a}\u{43e}\u{440}\u{43e}\u{442}\u{43a}\u{43e}\u{432}\u{43e}\u{43b}\u{43d}\u{43e}\u{432}\u{43e}\u{433}\u{43e} \u{441}\u{43e}\u{43b}\u{43d}\u{435}\u{447}\u{43d}\u{43e}\u{433}\u{43e} \u{438}\u{437}\u{43b}\u{443}\u{447}\u{435}\u{43d}\u{438}\u{44f}, \u{412}\u{442}/\u{43c}\u{b2}"),
    flx!("VGRD", 16, 597, Reducer::Mean, "V-component of Wind, m/s", "\u{41c}\u{435}\u{440}\u{438}\u{434}\u{438}\u{43e}\u{43d}\u{430}\u{43b}\u{44c}\u{43d}\u{430}\u{44f} \u{441}\u{43e}\u{441}\u{442}\u{430}\u{432}\u{43b}\u{44f}\u{44e}\u{449}\u{430}\u{44f} \u{432}\u{435}\u{442}\u{440}\u{430}, \u{442}.\u{435}. \u{43a}\u{43e}\u{43c}\u{43f}\u{43e}\u{43d}\u{435}\u{43d}\u{442} \u{432}\u{435}\u{442}\u{440}\u{430} \u{43f}\u{43e} \u{43e}\u{441}\u{438} \u{44e}\u{433}-\u{441}\u{435}\u{432}\u{435}\u{440}, \u{43c}/\u{441}"),
    flx!("WEASD", 8, 570, Reducer::Sum, "Water Equivalent of Accumulated Snow Depth, kg/m\u{b2}", "\u{412}\u{43e}\u{434}\u{43d}\u{44b}\u{439} \u{44d}\u{43a}\u{432}\u{438}\u{432}\u{430}\u{43b}\u{435}\u{43d}\u{442} \u{43d}\u{430}\u{43a}\u{43e}\u{43f}\u{43b}\u{435}\u{43d}\u{43d}\u{43e}\u{439} \u{433}\u{43b}\u{443}\u{431}\u{438}\u{43d}\u{44b} \u{441}\u{43d}\u{435}\u{433}\u{430}, \u{43a}\u{433}/\u{43c}\u{b2}"),
];

/// PGB-product bands, in upstream `CFS2_PGB_BANDS` order.
pub const PGB_BANDS: &[Cfs2Band] = &[Cfs2Band {
    name: "RH",
    family: Cfs2Family::Pgb,
    forecast_band: 1,
    reanalysis_band: 368,
    daily_stat: Reducer::Mean,
    label_en: "Relative Humidity , %",
    label_ru: "\u{41e}\u{442}\u{43d}\u{43e}\u{441}\u{438}\u{442}\u{435}\u{43b}\u{44c}\u{43d}\u{430}\u{44f} \u{432}\u{43b}\u{430}\u{436}\u{43d}\u{43e}\u{441}\u{442}\u{44c}, %",
}];

/// Look up a CFS2 variable by name across both FLX and PGB bands.
pub fn cfs2_band(name: &str) -> Option<&'static Cfs2Band> {
    FLX_BANDS
        .iter()
        .chain(PGB_BANDS.iter())
        .find(|b| b.name == name)
}

/// Every CFS2 variable name, FLX bands first then PGB bands, matching
/// upstream dict-merge order (`{**CFS2_FLX_BANDS, **CFS2_PGB_BANDS}`).
pub fn cfs2_variable_names() -> Vec<&'static str> {
    FLX_BANDS
        .iter()
        .chain(PGB_BANDS.iter())
        .map(|b| b.name)
        .collect()
}

/// One CMIP6 projection variable.
#[derive(Debug, Clone, Copy)]
pub struct Cmip6Variable {
    pub name: &'static str,
    pub label_en: &'static str,
    pub label_ru: &'static str,
}

/// CMIP6 variables, in upstream `CMIP6_VARS` order.
pub const CMIP6_VARS: &[Cmip6Variable] = &[
    Cmip6Variable {
        name: "hurs",
        label_en: "Near-surface relative humidity, %",
        label_ru: "",
    },
    Cmip6Variable {
        name: "huss",
        label_en: "Mass fraction\tNear-surface specific humidity",
        label_ru: "",
    },
    Cmip6Variable {
        name: "pr",
        label_en: "Precipitation (mean of the daily precipitation rate), kg/m\u{b2}/s",
        label_ru: "",
    },
    Cmip6Variable {
        name: "rlds",
        label_en: "Surface downwelling longwave radiation, W/m\u{b2}",
        label_ru: "",
    },
    Cmip6Variable {
        name: "rsds",
        label_en: "Surface downwelling shortwave radiation, W/m\u{b2}",
        label_ru: "",
    },
    Cmip6Variable {
        name: "sfcWind",
        label_en: "Daily-mean near-surface wind speed, m/s",
        label_ru: "",
    },
    Cmip6Variable {
        name: "tas",
        label_en: "Daily near-surface air temperature, K",
        label_ru: "",
    },
    Cmip6Variable {
        name: "tasmin",
        label_en: "Daily minimum near-surface air temperature, K",
        label_ru: "",
    },
    Cmip6Variable {
        name: "tasmax",
        label_en: "Daily maximum near-surface air temperature, K",
        label_ru: "",
    },
];

pub fn cmip6_variable(name: &str) -> Option<&'static Cmip6Variable> {
    CMIP6_VARS.iter().find(|v| v.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tmin_reuses_tmax_reanalysis_band() {
        let tmax = cfs2_band("TMAX").unwrap();
        let tmin = cfs2_band("TMIN").unwrap();
        assert_eq!(tmax.reanalysis_band, tmin.reanalysis_band);
        assert_eq!(tmax.reanalysis_band, 601);
        assert_eq!(tmin.daily_stat, Reducer::Min);
        assert_eq!(tmax.daily_stat, Reducer::Max);
    }

    #[test]
    fn cfs2_lookup_spans_flx_and_pgb() {
        assert!(cfs2_band("PRATE").is_some());
        assert_eq!(cfs2_band("RH").unwrap().family, Cfs2Family::Pgb);
        assert!(cfs2_band("NOTAVAR").is_none());
    }

    #[test]
    fn cfs2_variable_names_count_matches_bands() {
        assert_eq!(cfs2_variable_names().len(), FLX_BANDS.len() + PGB_BANDS.len());
    }

    #[test]
    fn cmip6_variables_found_by_name() {
        assert!(cmip6_variable("tasmin").is_some());
        assert!(cmip6_variable("tasmax").is_some());
        assert!(cmip6_variable("bogus").is_none());
    }

    #[test]
    fn reducer_mean_sum_min_max() {
        let vals = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(Reducer::Mean.reduce(&vals), 2.5);
        assert_eq!(Reducer::Sum.reduce(&vals), 10.0);
        assert_eq!(Reducer::Min.reduce(&vals), 1.0);
        assert_eq!(Reducer::Max.reduce(&vals), 4.0);
    }

    #[test]
    fn reducer_propagates_nan() {
        let vals = [1.0, f32::NAN, 3.0];
        assert!(Reducer::Mean.reduce(&vals).is_nan());
    }
}
