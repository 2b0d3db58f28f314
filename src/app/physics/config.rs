/// Named parameters for every force the layout solver applies.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ForceConfig {
    /// Upper bound on the rest length of a link.
    pub link_distance_cap: f32,
    /// Rest length is `viewport_width / link_distance_divisor` when that is shorter than the cap.
    pub link_distance_divisor: f32,
    /// Many-body strength; negative values repel.
    pub charge_strength: f32,
    /// Minimum center-to-center distance between two bodies.
    pub collision_radius: f32,
    pub collision_strength: f32,
    /// Pull toward the center on each axis, scaled by alpha.
    pub axis_strength: f32,
    pub velocity_decay: f32,
    pub alpha_min: f32,
    pub alpha_decay: f32,
    /// Alpha target held while a body is dragged, and the floor applied on resize.
    pub reheat_alpha: f32,
    pub barnes_hut_theta: f32,
}

impl Default for ForceConfig {
    fn default() -> Self {
        let alpha_min = 0.001_f32;
        Self {
            link_distance_cap: 60.0,
            link_distance_divisor: 20.0,
            charge_strength: -300.0,
            collision_radius: 15.0,
            collision_strength: 1.0,
            axis_strength: 0.1,
            velocity_decay: 0.4,
            alpha_min,
            alpha_decay: 1.0 - alpha_min.powf(1.0 / 300.0),
            reheat_alpha: 0.3,
            barnes_hut_theta: 0.9,
        }
    }
}

impl ForceConfig {
    /// Tighter preset for the small fixed-size neighborhood panel.
    pub fn local_graph() -> Self {
        Self {
            link_distance_cap: 80.0,
            link_distance_divisor: 3.5,
            charge_strength: -220.0,
            collision_radius: 34.0,
            axis_strength: 0.06,
            ..Self::default()
        }
    }

    pub fn link_distance(&self, viewport_width: f32) -> f32 {
        let scaled = viewport_width / self.link_distance_divisor.max(f32::EPSILON);
        self.link_distance_cap.min(scaled).max(1.0)
    }
}
