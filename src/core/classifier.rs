//! Rule-based surface type classification
//!
//! Four published rule sets share one skeleton: initialize every record as
//! unknown, then apply ocean, lead and sea-ice threshold rules in that order
//! and finish with the Level-1 land mask. Because `SurfaceType::add_flag`
//! overwrites, the application order is the priority order and land always
//! wins over any radar-derived misclassification.
//!
//! Thresholds are configuration, not constants: names and comparison
//! directions follow the published algorithms and are tunable per mission
//! and algorithm version.

use serde::{Deserialize, Serialize};

use crate::core::flag::AndCondition;
use crate::core::surface_type::{ClassifierParameterSet, SurfaceClass, SurfaceType};
use crate::types::{FlagMask, FloeResult, TrackArray};

fn ge(parameter: &TrackArray, threshold: f64) -> FlagMask {
    parameter.mapv(|v| v >= threshold)
}

fn gt(parameter: &TrackArray, threshold: f64) -> FlagMask {
    parameter.mapv(|v| v > threshold)
}

fn le(parameter: &TrackArray, threshold: f64) -> FlagMask {
    parameter.mapv(|v| v <= threshold)
}

fn lt(parameter: &TrackArray, threshold: f64) -> FlagMask {
    parameter.mapv(|v| v < threshold)
}

/// Surface type classifier selection with per-variant thresholds
///
/// Closed set: deserializing an unknown `name` tag is a configuration error
/// surfaced before any orbit is processed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "name", rename_all = "snake_case")]
pub enum SurfaceTypeClassifierDef {
    RickerTc2014(RickerTc2014Thresholds),
    Sicci2Cryosat2(Sicci2Thresholds),
    Sicci2Envisat(Sicci2Thresholds),
    Sicci1Envisat(Sicci1EnvisatThresholds),
}

impl SurfaceTypeClassifierDef {
    pub fn name(&self) -> &'static str {
        match self {
            SurfaceTypeClassifierDef::RickerTc2014(_) => "ricker_tc2014",
            SurfaceTypeClassifierDef::Sicci2Cryosat2(_) => "sicci2_cryosat2",
            SurfaceTypeClassifierDef::Sicci2Envisat(_) => "sicci2_envisat",
            SurfaceTypeClassifierDef::Sicci1Envisat(_) => "sicci1_envisat",
        }
    }

    /// Classify one orbit from its parameter set and the upstream land mask
    pub fn classify(
        &self,
        parameters: &ClassifierParameterSet,
        l1b_land_mask: &FlagMask,
    ) -> FloeResult<SurfaceType> {
        log::debug!(
            "Surface type classification: {} ({} records)",
            self.name(),
            parameters.n_records()
        );
        let mut surface_type = SurfaceType::new();
        set_unknown_default(&mut surface_type, parameters)?;
        match self {
            SurfaceTypeClassifierDef::RickerTc2014(thresholds) => {
                thresholds.classify_into(&mut surface_type, parameters)?
            }
            SurfaceTypeClassifierDef::Sicci2Cryosat2(thresholds) => {
                thresholds.classify_into(&mut surface_type, parameters, "sigma0")?
            }
            SurfaceTypeClassifierDef::Sicci2Envisat(thresholds) => {
                thresholds.classify_into(&mut surface_type, parameters, "sea_ice_backscatter")?
            }
            SurfaceTypeClassifierDef::Sicci1Envisat(thresholds) => {
                thresholds.classify_into(&mut surface_type, parameters)?
            }
        }
        // Land is copied verbatim from the Level-1 indicator, never
        // re-derived, and applied last so it is terminal.
        surface_type.add_flag(l1b_land_mask, SurfaceClass::Land)?;
        Ok(surface_type)
    }
}

fn set_unknown_default(
    surface_type: &mut SurfaceType,
    parameters: &ClassifierParameterSet,
) -> FloeResult<()> {
    let all = FlagMask::from_elem(parameters.n_records(), true);
    surface_type.add_flag(&all, SurfaceClass::Unknown)
}

/// Thresholds for the CryoSat-2 classifier of Ricker et al. (2014)
///
/// Ricker, R., Hendricks, S., Helm, V., Skourup, H., and Davidson, M.:
/// Sensitivity of CryoSat-2 Arctic sea-ice freeboard and thickness on
/// radar-waveform interpretation, The Cryosphere, 8, 1607-1622,
/// doi:10.5194/tc-8-1607-2014, 2014.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RickerTc2014Thresholds {
    pub ocean: RickerOceanThresholds,
    pub lead: RickerLeadThresholds,
    pub sea_ice: RickerSeaIceThresholds,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RickerOceanThresholds {
    pub peakiness_min: f64,
    pub peakiness_max: f64,
    pub stack_standard_deviation_min: f64,
    pub ice_concentration_min: f64,
    pub ocog_width_min: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RickerLeadThresholds {
    pub peakiness_l_min: f64,
    pub peakiness_r_min: f64,
    pub peakiness_min: f64,
    pub stack_kurtosis_min: f64,
    pub stack_standard_deviation_max: f64,
    pub ice_concentration_min: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RickerSeaIceThresholds {
    pub peakiness_r_max: f64,
    pub peakiness_l_max: f64,
    pub peakiness_max: f64,
    pub stack_kurtosis_max: f64,
    pub ice_concentration_min: f64,
}

impl RickerTc2014Thresholds {
    fn classify_into(
        &self,
        surface_type: &mut SurfaceType,
        parameters: &ClassifierParameterSet,
    ) -> FloeResult<()> {
        // Ocean: moderate peakiness band, broad stack, open water and a
        // rough surface in the OCOG width
        let opt = &self.ocean;
        let mut ocean = AndCondition::new();
        ocean.add(ge(parameters.get("peakiness")?, opt.peakiness_min))?;
        ocean.add(le(parameters.get("peakiness")?, opt.peakiness_max))?;
        ocean.add(ge(
            parameters.get("stack_standard_deviation")?,
            opt.stack_standard_deviation_min,
        ))?;
        ocean.add(lt(parameters.get("sic")?, opt.ice_concentration_min))?;
        ocean.add(ge(parameters.get("ocog_width")?, opt.ocog_width_min))?;
        surface_type.add_flag(&ocean.into_flag()?, SurfaceClass::Ocean)?;

        // Lead: specular returns in both beam halves with a narrow stack
        let opt = &self.lead;
        let mut lead = AndCondition::new();
        lead.add(ge(parameters.get("peakiness_l")?, opt.peakiness_l_min))?;
        lead.add(ge(parameters.get("peakiness_r")?, opt.peakiness_r_min))?;
        lead.add(ge(parameters.get("peakiness")?, opt.peakiness_min))?;
        lead.add(ge(parameters.get("stack_kurtosis")?, opt.stack_kurtosis_min))?;
        lead.add(lt(
            parameters.get("stack_standard_deviation")?,
            opt.stack_standard_deviation_max,
        ))?;
        lead.add(gt(parameters.get("sic")?, opt.ice_concentration_min))?;
        surface_type.add_flag(&lead.into_flag()?, SurfaceClass::Lead)?;

        // Sea ice: diffuse returns inside the ice pack
        let opt = &self.sea_ice;
        let mut ice = AndCondition::new();
        ice.add(le(parameters.get("peakiness_r")?, opt.peakiness_r_max))?;
        ice.add(le(parameters.get("peakiness_l")?, opt.peakiness_l_max))?;
        ice.add(le(parameters.get("peakiness")?, opt.peakiness_max))?;
        ice.add(lt(parameters.get("stack_kurtosis")?, opt.stack_kurtosis_max))?;
        ice.add(gt(parameters.get("sic")?, opt.ice_concentration_min))?;
        surface_type.add_flag(&ice.into_flag()?, SurfaceClass::SeaIce)?;
        Ok(())
    }
}

/// Unified SICCI-2 thresholds for CryoSat-2 and Envisat
///
/// Both missions use the same rule shape on peakiness, backscatter and the
/// two leading edge width halves; only the backscatter parameter name
/// differs (`sigma0` for CryoSat-2, `sea_ice_backscatter` for Envisat).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sicci2Thresholds {
    pub ocean: Sicci2OceanThresholds,
    pub lead: Sicci2LeadThresholds,
    pub sea_ice: Sicci2SeaIceThresholds,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sicci2OceanThresholds {
    pub peakiness_max: f64,
    pub ice_concentration_min: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sicci2LeadThresholds {
    pub sib_min: f64,
    pub lew1_max: f64,
    pub lew2_max: f64,
    pub peakiness_min: f64,
    pub ice_concentration_min: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sicci2SeaIceThresholds {
    pub sib_min: f64,
    pub sib_max: f64,
    pub lew1_min: f64,
    pub lew2_min: f64,
    pub peakiness_max: f64,
    pub ice_concentration_min: f64,
}

impl Sicci2Thresholds {
    fn classify_into(
        &self,
        surface_type: &mut SurfaceType,
        parameters: &ClassifierParameterSet,
        backscatter_parameter: &str,
    ) -> FloeResult<()> {
        let opt = &self.ocean;
        let mut ocean = AndCondition::new();
        ocean.add(le(parameters.get("peakiness")?, opt.peakiness_max))?;
        ocean.add(lt(parameters.get("sic")?, opt.ice_concentration_min))?;
        surface_type.add_flag(&ocean.into_flag()?, SurfaceClass::Ocean)?;

        let opt = &self.lead;
        let mut lead = AndCondition::new();
        lead.add(ge(parameters.get(backscatter_parameter)?, opt.sib_min))?;
        lead.add(le(
            parameters.get("leading_edge_width_first_half")?,
            opt.lew1_max,
        ))?;
        lead.add(le(
            parameters.get("leading_edge_width_second_half")?,
            opt.lew2_max,
        ))?;
        lead.add(ge(parameters.get("peakiness")?, opt.peakiness_min))?;
        lead.add(gt(parameters.get("sic")?, opt.ice_concentration_min))?;
        surface_type.add_flag(&lead.into_flag()?, SurfaceClass::Lead)?;

        let opt = &self.sea_ice;
        let mut ice = AndCondition::new();
        ice.add(ge(parameters.get(backscatter_parameter)?, opt.sib_min))?;
        ice.add(le(parameters.get(backscatter_parameter)?, opt.sib_max))?;
        ice.add(ge(
            parameters.get("leading_edge_width_first_half")?,
            opt.lew1_min,
        ))?;
        ice.add(ge(
            parameters.get("leading_edge_width_second_half")?,
            opt.lew2_min,
        ))?;
        ice.add(le(parameters.get("peakiness")?, opt.peakiness_max))?;
        ice.add(gt(parameters.get("sic")?, opt.ice_concentration_min))?;
        surface_type.add_flag(&ice.into_flag()?, SurfaceClass::SeaIce)?;
        Ok(())
    }
}

/// Legacy SICCI-1 Envisat thresholds: a two-threshold pulse peakiness split
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sicci1EnvisatThresholds {
    pub ocean: Sicci1OceanThresholds,
    pub lead: Sicci1LeadThresholds,
    pub sea_ice: Sicci1SeaIceThresholds,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sicci1OceanThresholds {
    pub pulse_peakiness_max: f64,
    pub ice_concentration_min: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sicci1LeadThresholds {
    pub pulse_peakiness_min: f64,
    pub ice_concentration_min: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sicci1SeaIceThresholds {
    pub pulse_peakiness_max: f64,
    pub ice_concentration_min: f64,
}

impl Sicci1EnvisatThresholds {
    fn classify_into(
        &self,
        surface_type: &mut SurfaceType,
        parameters: &ClassifierParameterSet,
    ) -> FloeResult<()> {
        let opt = &self.ocean;
        let mut ocean = AndCondition::new();
        ocean.add(lt(parameters.get("peakiness")?, opt.pulse_peakiness_max))?;
        ocean.add(lt(parameters.get("sic")?, opt.ice_concentration_min))?;
        surface_type.add_flag(&ocean.into_flag()?, SurfaceClass::Ocean)?;

        let opt = &self.lead;
        let mut lead = AndCondition::new();
        lead.add(gt(parameters.get("peakiness")?, opt.pulse_peakiness_min))?;
        lead.add(gt(parameters.get("sic")?, opt.ice_concentration_min))?;
        surface_type.add_flag(&lead.into_flag()?, SurfaceClass::Lead)?;

        let opt = &self.sea_ice;
        let mut ice = AndCondition::new();
        ice.add(lt(parameters.get("peakiness")?, opt.pulse_peakiness_max))?;
        ice.add(gt(parameters.get("sic")?, opt.ice_concentration_min))?;
        surface_type.add_flag(&ice.into_flag()?, SurfaceClass::SeaIce)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn sicci1_thresholds() -> SurfaceTypeClassifierDef {
        SurfaceTypeClassifierDef::Sicci1Envisat(Sicci1EnvisatThresholds {
            ocean: Sicci1OceanThresholds {
                pulse_peakiness_max: 10.0,
                ice_concentration_min: 15.0,
            },
            lead: Sicci1LeadThresholds {
                pulse_peakiness_min: 30.0,
                ice_concentration_min: 70.0,
            },
            sea_ice: Sicci1SeaIceThresholds {
                pulse_peakiness_max: 30.0,
                ice_concentration_min: 70.0,
            },
        })
    }

    #[test]
    fn test_sicci1_peakiness_split() {
        let mut parameters = ClassifierParameterSet::new();
        parameters
            .add_parameter("peakiness", array![5.0, 45.0, 12.0])
            .unwrap();
        parameters
            .add_parameter("sic", array![0.0, 95.0, 95.0])
            .unwrap();
        let land = array![false, false, false];

        let surface_type = sicci1_thresholds().classify(&parameters, &land).unwrap();
        let codes = surface_type.flag().unwrap();
        assert_eq!(codes[0], SurfaceClass::Ocean.code());
        assert_eq!(codes[1], SurfaceClass::Lead.code());
        assert_eq!(codes[2], SurfaceClass::SeaIce.code());
    }

    #[test]
    fn test_missing_parameter_is_fatal() {
        let mut parameters = ClassifierParameterSet::new();
        parameters
            .add_parameter("peakiness", array![5.0, 45.0])
            .unwrap();
        let land = array![false, false];
        let result = sicci1_thresholds().classify(&parameters, &land);
        assert!(matches!(
            result,
            Err(crate::types::FloeError::InvalidConfig(_))
        ));
    }
}
