use crate::mesh3d::DecimateParams;

/// Parameters of the label mesh extraction
#[derive(Debug, Clone, PartialEq)]
pub struct MeshingParams {
    /// Face count divisor applied to every label mesh; 0 or 1 keep all faces.
    /// Default: 0
    pub reduction_factor: u32,

    /// Maximum quadric error of one collapse during reduction. Default: None
    pub max_error: Option<f64>,

    /// Closes surfaces touching the volume border. Default: true
    pub close_boundaries: bool,
}

impl Default for MeshingParams {
    fn default() -> Self {
        Self {
            reduction_factor: 0,
            max_error: None,
            close_boundaries: true,
        }
    }
}

impl MeshingParams {
    /// Sets the reduction factor
    #[must_use]
    pub const fn with_reduction_factor(mut self, factor: u32) -> Self {
        self.reduction_factor = factor;
        self
    }

    /// Sets maximum error threshold
    #[must_use]
    pub const fn with_max_error(mut self, max_error: f64) -> Self {
        self.max_error = Some(max_error);
        self
    }

    /// Sets boundary closing
    #[must_use]
    pub const fn with_close_boundaries(mut self, close: bool) -> Self {
        self.close_boundaries = close;
        self
    }

    /// Decimation parameters, if the meshes are to be reduced
    pub fn decimate_params(&self) -> Option<DecimateParams> {
        if self.reduction_factor <= 1 {
            return None;
        }
        let params = DecimateParams::from_reduction_factor(self.reduction_factor);
        Some(match self.max_error {
            Some(max_error) => params.with_max_error(max_error),
            None => params,
        })
    }
}
