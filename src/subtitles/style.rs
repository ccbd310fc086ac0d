use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};

/// User-facing subtitle appearance options (`[style]` in the config file).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubtitleStyle {
    /// Font family; must be installed where ffmpeg renders
    pub font_name: String,
    pub font_size: u32,
    /// Color name or #RRGGBB
    pub font_color: String,
    /// Color name or #RRGGBB
    pub background_color: String,
    /// 0 = fully transparent, 100 = opaque
    pub background_opacity: u8,
    /// left, center, right, middle-left, middle, middle-right, top-left, top, top-right
    pub alignment: String,
    pub margin_v: u32,
    pub line_spacing: i32,
    pub margin_h: u32,
    pub play_res_x: u32,
    pub play_res_y: u32,
}

impl Default for SubtitleStyle {
    fn default() -> Self {
        Self {
            font_name: "PingFang SC".to_string(),
            font_size: 28,
            font_color: "white".to_string(),
            background_color: "black".to_string(),
            background_opacity: 60,
            alignment: "center".to_string(),
            margin_v: 25,
            line_spacing: -2,
            margin_h: 10,
            play_res_x: 1920,
            play_res_y: 1080,
        }
    }
}

impl SubtitleStyle {
    /// Check every option that can be wrong without rendering anything.
    pub fn validate(&self) -> Result<()> {
        AssStyle::from_options(self).map(|_| ())
    }
}

/// A resolved ASS `Style:` record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssStyle {
    pub name: String,
    pub font_name: String,
    pub font_size: u32,
    /// &HAABBGGRR
    pub primary_color: String,
    pub secondary_color: String,
    pub outline_color: String,
    pub back_color: String,
    pub spacing: i32,
    pub outline: u32,
    pub shadow: u32,
    /// Numpad layout: 1-3 bottom, 4-6 middle, 7-9 top
    pub alignment: u8,
    pub margin_l: u32,
    pub margin_r: u32,
    pub margin_v: u32,
    pub play_res: (u32, u32),
}

pub const DEFAULT_STYLE_NAME: &str = "Default";

impl AssStyle {
    pub fn from_options(options: &SubtitleStyle) -> Result<Self> {
        if options.font_name.trim().is_empty() {
            bail!("style.font_name must not be empty");
        }
        if options.font_name.contains(',') {
            bail!(
                "style.font_name '{}' must not contain a comma",
                options.font_name
            );
        }
        if options.font_size == 0 {
            bail!("style.font_size must be greater than zero");
        }
        if options.background_opacity > 100 {
            bail!(
                "style.background_opacity must be between 0 and 100, got {}",
                options.background_opacity
            );
        }
        if options.play_res_x == 0 || options.play_res_y == 0 {
            bail!("style.play_res_x and style.play_res_y must be greater than zero");
        }

        let font_rgb = parse_color(&options.font_color)
            .map_err(|e| e.context("invalid style.font_color"))?;
        let back_rgb = parse_color(&options.background_color)
            .map_err(|e| e.context("invalid style.background_color"))?;

        Ok(Self {
            name: DEFAULT_STYLE_NAME.to_string(),
            font_name: options.font_name.trim().to_string(),
            font_size: options.font_size,
            primary_color: ass_color(font_rgb, 0),
            secondary_color: ass_color((0xFF, 0x00, 0x00), 0),
            outline_color: ass_color((0x00, 0x00, 0x00), 0),
            back_color: ass_color(back_rgb, opacity_to_alpha(options.background_opacity)),
            spacing: options.line_spacing,
            outline: 2,
            shadow: 1,
            alignment: parse_alignment(&options.alignment)?,
            margin_l: options.margin_h,
            margin_r: options.margin_h,
            margin_v: options.margin_v,
            play_res: (options.play_res_x, options.play_res_y),
        })
    }

    /// Format the style line for the ASS file.
    pub fn to_style_line(&self) -> String {
        format!(
            "Style: {name},{font},{size},{primary},{secondary},{outline},{back},0,0,0,0,100,100,{spacing},0,1,{outline_w},{shadow},{align},{ml},{mr},{mv},1",
            name = self.name,
            font = self.font_name,
            size = self.font_size,
            primary = self.primary_color,
            secondary = self.secondary_color,
            outline = self.outline_color,
            back = self.back_color,
            spacing = self.spacing,
            outline_w = self.outline,
            shadow = self.shadow,
            align = self.alignment,
            ml = self.margin_l,
            mr = self.margin_r,
            mv = self.margin_v,
        )
    }
}

/// Parse a color name or `#RRGGBB` into (r, g, b).
pub fn parse_color(value: &str) -> Result<(u8, u8, u8)> {
    let value = value.trim();
    if let Some(hex) = value.strip_prefix('#') {
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            bail!("'{}' is not a #RRGGBB color", value);
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16);
        return Ok((channel(0)?, channel(2)?, channel(4)?));
    }

    let rgb = match value.to_ascii_lowercase().as_str() {
        "white" => (0xFF, 0xFF, 0xFF),
        "black" => (0x00, 0x00, 0x00),
        "red" => (0xFF, 0x00, 0x00),
        "green" => (0x00, 0xFF, 0x00),
        "blue" => (0x00, 0x00, 0xFF),
        "yellow" => (0xFF, 0xFF, 0x00),
        "cyan" => (0x00, 0xFF, 0xFF),
        "magenta" => (0xFF, 0x00, 0xFF),
        "gray" | "grey" => (0x80, 0x80, 0x80),
        _ => bail!("unknown color '{}' (use a name like white or #RRGGBB)", value),
    };
    Ok(rgb)
}

/// ASS colors are &HAABBGGRR with alpha 00 meaning opaque.
pub fn ass_color((r, g, b): (u8, u8, u8), alpha: u8) -> String {
    format!("&H{:02X}{:02X}{:02X}{:02X}", alpha, b, g, r)
}

pub fn opacity_to_alpha(opacity_percent: u8) -> u8 {
    let opacity = u32::from(opacity_percent.min(100));
    // Round to nearest
    ((255 * (100 - opacity) + 50) / 100) as u8
}

pub fn parse_alignment(value: &str) -> Result<u8> {
    let code = match value.trim().to_ascii_lowercase().as_str() {
        "left" | "bottom-left" => 1,
        "center" | "centre" | "bottom" | "bottom-center" => 2,
        "right" | "bottom-right" => 3,
        "middle-left" => 4,
        "middle" | "middle-center" => 5,
        "middle-right" => 6,
        "top-left" => 7,
        "top" | "top-center" => 8,
        "top-right" => 9,
        other => bail!("unknown style.alignment '{}'", other),
    };
    Ok(code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_options_produce_expected_style_line() {
        let style = AssStyle::from_options(&SubtitleStyle::default()).unwrap();
        assert_eq!(
            style.to_style_line(),
            "Style: Default,PingFang SC,28,&H00FFFFFF,&H000000FF,&H00000000,&H66000000,0,0,0,0,100,100,-2,0,1,2,1,2,10,10,25,1"
        );
        assert_eq!(style.play_res, (1920, 1080));
    }

    #[test]
    fn colors_are_written_as_bgr() {
        assert_eq!(ass_color(parse_color("#112233").unwrap(), 0), "&H00332211");
        assert_eq!(ass_color(parse_color("red").unwrap(), 0x80), "&H800000FF");
        assert_eq!(parse_color(" Yellow ").unwrap(), (0xFF, 0xFF, 0x00));
    }

    #[test]
    fn invalid_colors_are_rejected() {
        assert!(parse_color("#12345").is_err());
        assert!(parse_color("#GGGGGG").is_err());
        assert!(parse_color("chartreuse").is_err());
    }

    #[test]
    fn opacity_maps_to_inverted_alpha() {
        assert_eq!(opacity_to_alpha(100), 0x00);
        assert_eq!(opacity_to_alpha(0), 0xFF);
        assert_eq!(opacity_to_alpha(60), 0x66);
        assert_eq!(opacity_to_alpha(50), 0x80);
    }

    #[test]
    fn alignment_names_follow_numpad_layout() {
        assert_eq!(parse_alignment("left").unwrap(), 1);
        assert_eq!(parse_alignment("center").unwrap(), 2);
        assert_eq!(parse_alignment("middle").unwrap(), 5);
        assert_eq!(parse_alignment("TOP-RIGHT").unwrap(), 9);
        assert!(parse_alignment("diagonal").is_err());
    }

    #[test]
    fn options_map_to_their_style_fields() {
        let options = SubtitleStyle {
            font_name: "Noto Sans CJK SC".to_string(),
            font_size: 40,
            font_color: "yellow".to_string(),
            background_color: "#202020".to_string(),
            background_opacity: 100,
            alignment: "top".to_string(),
            margin_v: 60,
            line_spacing: 3,
            margin_h: 30,
            play_res_x: 1280,
            play_res_y: 720,
        };
        let style = AssStyle::from_options(&options).unwrap();
        assert_eq!(style.primary_color, "&H0000FFFF");
        assert_eq!(style.back_color, "&H00202020");
        assert_eq!(style.alignment, 8);
        assert_eq!((style.margin_l, style.margin_r, style.margin_v), (30, 30, 60));
        assert_eq!(style.spacing, 3);
        assert_eq!(style.play_res, (1280, 720));
    }

    #[test]
    fn out_of_range_options_fail_validation() {
        let too_opaque = SubtitleStyle {
            background_opacity: 101,
            ..SubtitleStyle::default()
        };
        assert!(too_opaque.validate().is_err());

        let comma_font = SubtitleStyle {
            font_name: "Bad, Font".to_string(),
            ..SubtitleStyle::default()
        };
        assert!(comma_font.validate().is_err());

        let bad_color = SubtitleStyle {
            font_color: "nope".to_string(),
            ..SubtitleStyle::default()
        };
        let err = bad_color.validate().unwrap_err();
        assert!(format!("{:#}", err).contains("invalid style.font_color"));
    }
}
