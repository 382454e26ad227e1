//! Scaling modes: named effect chains that profiles reference by index
//!
//! The registry owns its slice of the settings document (the `scalingModes`
//! array) and ships the built-in modes written on first run.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

use super::document::{read_array, read_f32, read_object, read_string, read_u32};

u32_enum! {
    /// How an effect sizes its output
    #[derive(Default)]
    pub enum ScalingType {
        /// Multiply the input size by `scale`
        #[default]
        Normal = 0,
        /// Fit the output area, keeping the aspect ratio
        Fit = 1,
        /// Output exactly `scale` pixels
        Absolute = 2,
        /// Fill the output area, ignoring the aspect ratio
        Fill = 3,
    }
}

impl ScalingType {
    /// Whether `EffectInstance::scale` is used by this type
    pub const fn has_scale(self) -> bool {
        matches!(self, ScalingType::Normal | ScalingType::Absolute)
    }
}

/// One effect in a chain with its numeric parameters
#[derive(Debug, Clone, PartialEq)]
pub struct EffectInstance {
    pub name: String,
    pub scaling_type: ScalingType,
    pub scale: (f32, f32),
    pub parameters: BTreeMap<String, f32>,
}

impl Default for EffectInstance {
    fn default() -> Self {
        Self {
            name: String::new(),
            scaling_type: ScalingType::default(),
            scale: (1.0, 1.0),
            parameters: BTreeMap::new(),
        }
    }
}

impl EffectInstance {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_scaling_type(mut self, scaling_type: ScalingType) -> Self {
        self.scaling_type = scaling_type;
        self
    }

    pub fn with_scale(mut self, x: f32, y: f32) -> Self {
        self.scale = (x, y);
        self
    }

    pub fn with_parameter(mut self, name: impl Into<String>, value: f32) -> Self {
        self.parameters.insert(name.into(), value);
        self
    }

    pub fn parameter(&self, name: &str) -> Option<f32> {
        self.parameters.get(name).copied()
    }

    /// Drop non-finite parameters and reset a non-finite scale
    pub fn sanitize(&mut self) {
        self.parameters.retain(|name, value| {
            let keep = value.is_finite();
            if !keep {
                debug!(effect = %self.name, parameter = %name, "Dropping non-finite effect parameter");
            }
            keep
        });
        if !(self.scale.0.is_finite() && self.scale.1.is_finite()) {
            self.scale = (1.0, 1.0);
        }
    }

    /// Decode one element of a mode's `effects` array; `None` without a name
    fn import(obj: &Map<String, Value>) -> Option<Self> {
        let name = read_string(obj, "name").filter(|name| !name.is_empty())?;
        let mut effect = EffectInstance::new(name);

        if let Some(scaling_type) = read_u32(obj, "scalingType").and_then(ScalingType::from_u32) {
            effect.scaling_type = scaling_type;
        }

        if let Some(scale) = read_object(obj, "scale") {
            if let (Some(x), Some(y)) = (read_f32(scale, "x"), read_f32(scale, "y")) {
                effect.scale = (x, y);
            }
        }

        if let Some(parameters) = read_object(obj, "parameters") {
            effect.parameters = read_parameters(parameters);
        }

        Some(effect)
    }

    fn export(&self) -> EffectDocument<'_> {
        EffectDocument {
            name: &self.name,
            scaling_type: self.scaling_type.as_u32(),
            scale: self.scaling_type.has_scale().then(|| ScaleDocument {
                x: self.scale.0,
                y: self.scale.1,
            }),
            parameters: &self.parameters,
        }
    }
}

/// Collect numeric entries of a `parameters` object, skipping anything else
pub(crate) fn read_parameters(obj: &Map<String, Value>) -> BTreeMap<String, f32> {
    obj.iter()
        .filter_map(|(name, value)| match value.as_f64() {
            Some(number) => Some((name.clone(), number as f32)),
            None => {
                debug!(parameter = %name, value = %value, "Ignoring non-numeric effect parameter");
                None
            }
        })
        .collect()
}

/// Named chain of effects
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ScalingMode {
    pub name: String,
    pub effects: Vec<EffectInstance>,
}

impl ScalingMode {
    pub fn new(name: impl Into<String>, effects: Vec<EffectInstance>) -> Self {
        Self {
            name: name.into(),
            effects,
        }
    }

    pub fn sanitize(&mut self) {
        self.effects.iter_mut().for_each(EffectInstance::sanitize);
    }

    fn import(obj: &Map<String, Value>) -> Option<Self> {
        let name = read_string(obj, "name").filter(|name| !name.is_empty())?;
        let effects = read_array(obj, "effects")
            .map(|effects| {
                effects
                    .iter()
                    .filter_map(Value::as_object)
                    .filter_map(EffectInstance::import)
                    .collect()
            })
            .unwrap_or_default();

        Some(Self { name, effects })
    }
}

/// Ordered list of scaling modes; profiles store an index into it
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ScalingModeRegistry {
    modes: Vec<ScalingMode>,
}

impl ScalingModeRegistry {
    pub fn new(modes: Vec<ScalingMode>) -> Self {
        Self { modes }
    }

    /// The seven built-in modes written on first run
    pub fn with_defaults() -> Self {
        Self::new(default_scaling_modes())
    }

    pub fn modes(&self) -> &[ScalingMode] {
        &self.modes
    }

    pub fn len(&self) -> usize {
        self.modes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modes.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ScalingMode> {
        self.modes.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut ScalingMode> {
        self.modes.get_mut(index)
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.modes.iter().position(|mode| mode.name == name)
    }

    /// Whether a profile's `scalingMode` value refers to an existing mode
    pub fn contains_index(&self, index: i32) -> bool {
        usize::try_from(index).is_ok_and(|index| index < self.modes.len())
    }

    pub(crate) fn push(&mut self, mode: ScalingMode) -> usize {
        self.modes.push(mode);
        self.modes.len() - 1
    }

    pub(crate) fn remove(&mut self, index: usize) -> Option<ScalingMode> {
        (index < self.modes.len()).then(|| self.modes.remove(index))
    }

    /// Swap with the previous (`up`) or next mode; returns the new index
    pub(crate) fn swap_with_neighbor(&mut self, index: usize, up: bool) -> Option<usize> {
        let target = if up {
            index.checked_sub(1)?
        } else {
            index.checked_add(1).filter(|&next| next < self.modes.len())?
        };
        if index >= self.modes.len() {
            return None;
        }
        self.modes.swap(index, target);
        Some(target)
    }

    /// Decode the `scalingModes` array of a settings document.
    /// `None` when the key is absent or not an array; bad entries are dropped.
    pub fn import(root: &Map<String, Value>) -> Option<Self> {
        let entries = read_array(root, "scalingModes")?;
        let modes: Vec<ScalingMode> = entries
            .iter()
            .filter_map(Value::as_object)
            .filter_map(ScalingMode::import)
            .collect();

        if modes.len() != entries.len() {
            debug!(kept = modes.len(), total = entries.len(), "Dropped invalid scaling modes");
        }
        Some(Self::new(modes))
    }

    pub(crate) fn export(&self) -> Vec<ScalingModeDocument<'_>> {
        self.modes
            .iter()
            .map(|mode| ScalingModeDocument {
                name: &mode.name,
                effects: mode.effects.iter().map(EffectInstance::export).collect(),
            })
            .collect()
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct ScalingModeDocument<'a> {
    name: &'a str,
    effects: Vec<EffectDocument<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EffectDocument<'a> {
    name: &'a str,
    scaling_type: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    scale: Option<ScaleDocument>,
    #[serde(skip_serializing_if = "has_no_parameters")]
    parameters: &'a BTreeMap<String, f32>,
}

fn has_no_parameters(parameters: &&BTreeMap<String, f32>) -> bool {
    parameters.is_empty()
}

#[derive(Debug, Serialize)]
struct ScaleDocument {
    x: f32,
    y: f32,
}

/// Built-in scaling modes, in the order they are offered to the user
pub fn default_scaling_modes() -> Vec<ScalingMode> {
    vec![
        ScalingMode::new(
            "Lanczos",
            vec![EffectInstance::new("Lanczos").with_scaling_type(ScalingType::Fit)],
        ),
        ScalingMode::new(
            "FSR",
            vec![
                EffectInstance::new("FSR\\FSR_EASU").with_scaling_type(ScalingType::Fit),
                EffectInstance::new("FSR\\FSR_RCAS").with_parameter("sharpness", 0.87),
            ],
        ),
        ScalingMode::new("FSRCNNX", vec![EffectInstance::new("FSRCNNX\\FSRCNNX")]),
        ScalingMode::new("ACNet", vec![EffectInstance::new("ACNet")]),
        ScalingMode::new(
            "Anime4K",
            vec![EffectInstance::new("Anime4K\\Anime4K_Upscale_Denoise_L")],
        ),
        ScalingMode::new(
            "CRT-Geom",
            vec![
                EffectInstance::new("CRT\\CRT_Geom")
                    .with_scaling_type(ScalingType::Fit)
                    .with_parameter("curvature", 0.0)
                    .with_parameter("cornerSize", 0.001)
                    .with_parameter("CRTGamma", 1.5)
                    .with_parameter("monitorGamma", 2.2)
                    .with_parameter("interlace", 0.0),
            ],
        ),
        ScalingMode::new(
            "Integer Scale 2x",
            vec![
                EffectInstance::new("Nearest")
                    .with_scaling_type(ScalingType::Normal)
                    .with_scale(2.0, 2.0),
            ],
        ),
    ]
}

/// Bicubic with B = 0, C = 0.5
pub fn default_downscaling_effect() -> EffectInstance {
    EffectInstance::new("Bicubic")
        .with_parameter("paramB", 0.0)
        .with_parameter("paramC", 0.5)
}
