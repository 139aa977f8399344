use crate::foundation::{
    core::Size,
    error::{TrialkitError, TrialkitResult},
};

/// Options controlling a [`crate::FrameDriver`].
///
/// All fields have defaults, so a partial JSON object is enough:
///
/// ```
/// let opts = trialkit::EngineOpts::from_json_str(r#"{ "drag_threshold": 8.0 }"#).unwrap();
/// assert_eq!(opts.drag_threshold, 8.0);
/// ```
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct EngineOpts {
    /// Size of the host surface in points.
    pub surface_size: Size,
    /// Pointer travel (in surface points) after a tap-down before a drag starts.
    pub drag_threshold: f64,
    /// Upper bound applied to each frame delta. `None` passes host deltas through unchanged.
    pub max_frame_delta_ms: Option<f64>,
}

impl Default for EngineOpts {
    fn default() -> Self {
        Self {
            surface_size: Size::new(400.0, 800.0),
            drag_threshold: 4.0,
            max_frame_delta_ms: None,
        }
    }
}

impl EngineOpts {
    /// Parse options from JSON, filling missing fields with defaults.
    pub fn from_json_str(s: &str) -> TrialkitResult<Self> {
        let opts: Self = serde_json::from_str(s)
            .map_err(|e| TrialkitError::serde(format!("parse engine options: {e}")))?;
        opts.validate()?;
        Ok(opts)
    }

    pub fn validate(&self) -> TrialkitResult<()> {
        let Size { width, height } = self.surface_size;
        if !(width.is_finite() && height.is_finite()) || width <= 0.0 || height <= 0.0 {
            return Err(TrialkitError::configuration(
                "surface_size must be finite and positive",
            ));
        }
        if !self.drag_threshold.is_finite() || self.drag_threshold < 0.0 {
            return Err(TrialkitError::configuration(
                "drag_threshold must be finite and >= 0",
            ));
        }
        if let Some(max) = self.max_frame_delta_ms
            && (!max.is_finite() || max <= 0.0)
        {
            return Err(TrialkitError::configuration(
                "max_frame_delta_ms must be finite and > 0",
            ));
        }
        Ok(())
    }

    /// Clamp a host frame delta according to these options.
    pub fn clamp_delta(&self, delta_ms: f64) -> f64 {
        let delta = if delta_ms.is_finite() {
            delta_ms.max(0.0)
        } else {
            0.0
        };
        match self.max_frame_delta_ms {
            Some(max) => delta.min(max),
            None => delta,
        }
    }
}
