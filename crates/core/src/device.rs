//! Page geometry and typography per target tablet.

/// Horizontal placement of the feature image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageAlign {
    Left,
    Center,
}

/// Page margins in points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Margins {
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    pub left: f32,
}

/// Everything the layout engine needs to know about one device.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeviceProfile {
    pub name: &'static str,
    /// Label on the index page icon.
    pub label: &'static str,
    /// Named destination of the device's section.
    pub destination: &'static str,
    pub page_width: f32,
    pub page_height: f32,
    pub margins: Margins,
    pub base_font_size: f32,
    pub line_height_multiplier: f32,
    pub image_align: ImageAlign,
}

/// reMarkable Paper Pro Move.
pub const PAPER_PRO_MOVE: DeviceProfile = DeviceProfile {
    name: "reMarkable Paper Pro Move",
    label: "Paper Pro Move",
    destination: "proMoveStart",
    page_width: 954.0 / 1.5,
    page_height: 1696.0 / 1.5,
    margins: Margins { top: 100.0, right: 50.0, bottom: 40.0, left: 50.0 },
    base_font_size: 22.0,
    line_height_multiplier: 1.5,
    image_align: ImageAlign::Center,
};

/// reMarkable Paper Pro.
pub const PAPER_PRO: DeviceProfile = DeviceProfile {
    name: "reMarkable Paper Pro",
    label: "Paper Pro",
    destination: "proStart",
    page_width: 1620.0 / 1.5,
    page_height: 2160.0 / 1.5,
    margins: Margins { top: 120.0, right: 60.0, bottom: 50.0, left: 60.0 },
    base_font_size: 28.0,
    line_height_multiplier: 1.5,
    image_align: ImageAlign::Left,
};

impl DeviceProfile {
    /// Width between the left and right margins.
    pub fn content_width(&self) -> f32 {
        self.page_width - self.margins.left - self.margins.right
    }

    /// Extra space between body lines on top of the font's own line height.
    pub fn line_gap(&self) -> f32 {
        self.base_font_size * self.line_height_multiplier - self.base_font_size
    }
}

/// The two devices every document is laid out for.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeviceProfiles {
    /// First section, left icon on the index page.
    pub compact: DeviceProfile,
    /// Second section; also provides the index page geometry.
    pub large: DeviceProfile,
}

impl Default for DeviceProfiles {
    fn default() -> Self {
        Self { compact: PAPER_PRO_MOVE, large: PAPER_PRO }
    }
}

impl DeviceProfiles {
    /// Profiles in section order.
    pub fn in_order(&self) -> [&DeviceProfile; 2] {
        [&self.compact, &self.large]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_geometry() {
        assert_eq!(PAPER_PRO_MOVE.page_width, 636.0);
        assert!((PAPER_PRO_MOVE.page_height - 1130.6667).abs() < 1e-3);
        assert_eq!(PAPER_PRO.page_width, 1080.0);
        assert_eq!(PAPER_PRO.page_height, 1440.0);
        assert_eq!(PAPER_PRO.content_width(), 960.0);
    }

    #[test]
    fn test_line_gap() {
        assert_eq!(PAPER_PRO_MOVE.line_gap(), 11.0);
        assert_eq!(PAPER_PRO.line_gap(), 14.0);
    }

    #[test]
    fn test_section_order() {
        let profiles = DeviceProfiles::default();
        let destinations: Vec<&str> = profiles.in_order().iter().map(|p| p.destination).collect();
        assert_eq!(destinations, vec!["proMoveStart", "proStart"]);
    }
}
