//! Defines the `CompassPoint` enum, mapping the station's 16-point wind direction labels
//! to degrees.

/// A point of the 16-point compass rose as reported by the station's wind vane.
///
/// Discriminants are multiples of 22.5° counted clockwise from north, so
/// `CompassPoint::degrees` is `index * 22.5`.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum CompassPoint {
    /// 0°
    N = 0,
    /// 22.5°
    Nne = 1,
    /// 45°
    Ne = 2,
    /// 67.5°
    Ene = 3,
    /// 90°
    E = 4,
    /// 112.5°
    Ese = 5,
    /// 135°
    Se = 6,
    /// 157.5°
    Sse = 7,
    /// 180°
    S = 8,
    /// 202.5°
    Ssw = 9,
    /// 225°
    Sw = 10,
    /// 247.5°
    Wsw = 11,
    /// 270°
    W = 12,
    /// 292.5°
    Wnw = 13,
    /// 315°
    Nw = 14,
    /// 337.5°
    Nnw = 15,
}

/// Angular distance between two neighbouring compass points.
pub const COMPASS_STEP_DEGREES: f64 = 22.5;

impl CompassPoint {
    /// All points in clockwise order starting at north.
    pub const ALL: [CompassPoint; 16] = [
        CompassPoint::N,
        CompassPoint::Nne,
        CompassPoint::Ne,
        CompassPoint::Ene,
        CompassPoint::E,
        CompassPoint::Ese,
        CompassPoint::Se,
        CompassPoint::Sse,
        CompassPoint::S,
        CompassPoint::Ssw,
        CompassPoint::Sw,
        CompassPoint::Wsw,
        CompassPoint::W,
        CompassPoint::Wnw,
        CompassPoint::Nw,
        CompassPoint::Nnw,
    ];

    /// Parses an abbreviation such as `"NE"` or `"wsw"`.
    ///
    /// Surrounding whitespace and letter case are ignored. Anything else, including labels the
    /// station emits for still air such as `"Calm"`, returns `None`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use station_forecast::CompassPoint;
    ///
    /// assert_eq!(CompassPoint::from_label("NE"), Some(CompassPoint::Ne));
    /// assert_eq!(CompassPoint::from_label(" nnw "), Some(CompassPoint::Nnw));
    /// assert_eq!(CompassPoint::from_label("Calm"), None);
    /// ```
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_uppercase().as_str() {
            "N" => Some(CompassPoint::N),
            "NNE" => Some(CompassPoint::Nne),
            "NE" => Some(CompassPoint::Ne),
            "ENE" => Some(CompassPoint::Ene),
            "E" => Some(CompassPoint::E),
            "ESE" => Some(CompassPoint::Ese),
            "SE" => Some(CompassPoint::Se),
            "SSE" => Some(CompassPoint::Sse),
            "S" => Some(CompassPoint::S),
            "SSW" => Some(CompassPoint::Ssw),
            "SW" => Some(CompassPoint::Sw),
            "WSW" => Some(CompassPoint::Wsw),
            "W" => Some(CompassPoint::W),
            "WNW" => Some(CompassPoint::Wnw),
            "NW" => Some(CompassPoint::Nw),
            "NNW" => Some(CompassPoint::Nnw),
            _ => None,
        }
    }

    pub fn degrees(self) -> f64 {
        self as u8 as f64 * COMPASS_STEP_DEGREES
    }

    pub fn label(self) -> &'static str {
        match self {
            CompassPoint::N => "N",
            CompassPoint::Nne => "NNE",
            CompassPoint::Ne => "NE",
            CompassPoint::Ene => "ENE",
            CompassPoint::E => "E",
            CompassPoint::Ese => "ESE",
            CompassPoint::Se => "SE",
            CompassPoint::Sse => "SSE",
            CompassPoint::S => "S",
            CompassPoint::Ssw => "SSW",
            CompassPoint::Sw => "SW",
            CompassPoint::Wsw => "WSW",
            CompassPoint::W => "W",
            CompassPoint::Wnw => "WNW",
            CompassPoint::Nw => "NW",
            CompassPoint::Nnw => "NNW",
        }
    }
}

/// Normalizes a raw wind direction reading to degrees.
///
/// Compass labels are mapped through [`CompassPoint::from_label`]. Numeric readings in
/// `[0, 360)` are taken as degrees already. Everything else is missing (`None`); no default
/// direction is ever substituted.
///
/// # Examples
///
/// ```rust
/// use station_forecast::wind_direction_degrees;
///
/// assert_eq!(wind_direction_degrees("NE"), Some(45.0));
/// assert_eq!(wind_direction_degrees("202.5"), Some(202.5));
/// assert_eq!(wind_direction_degrees("Calm"), None);
/// assert_eq!(wind_direction_degrees("400"), None);
/// ```
pub fn wind_direction_degrees(raw: &str) -> Option<f64> {
    if let Some(point) = CompassPoint::from_label(raw) {
        return Some(point.degrees());
    }
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|deg| (0.0..360.0).contains(deg))
}
