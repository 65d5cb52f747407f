//! Antenna tracker parameters and live target override.

use super::{DeviceClient, FormFields};
use anyhow::Result;
use serde::{Deserialize, Serialize};

pub const AAT_PATH: &str = "/aatconfig";
pub const AAT_TITLE: &str = "Update AAT Parameters";
pub const AAT_FAILURE: &str = "An error occurred changing values";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AatConfig {
    /// Minimum satellites before the home position is set. Reported by the
    /// device only, never part of [`AatConfig::form`].
    pub satmin: u8,
    pub servosmoo: u8,
    pub servomode: u8,
    pub project: u8,
    /// Index into N/E/S/W, see [`AzimuthCenter`].
    pub azim_center: u8,
    pub azim_min: u16,
    pub azim_max: u16,
    pub elev_min: u16,
    pub elev_max: u16,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VbatConfig {
    pub offset: i32,
    pub scale: i32,
    /// Last measured battery voltage, read only.
    pub vbat: Option<f64>,
}

impl AatConfig {
    /// Fields submitted by the AAT form. `commit` persists them on the
    /// device, otherwise they only apply until reboot.
    pub fn form(&self, vbat: &VbatConfig, commit: bool) -> FormFields {
        vec![
            ("servosmoo", self.servosmoo.to_string()),
            ("servomode", self.servomode.to_string()),
            ("azim_center", self.azim_center.to_string()),
            ("azim_min", self.azim_min.to_string()),
            ("azim_max", self.azim_max.to_string()),
            ("elev_min", self.elev_min.to_string()),
            ("elev_max", self.elev_max.to_string()),
            ("vbat_offset", vbat.offset.to_string()),
            ("vbat_scale", vbat.scale.to_string()),
            ("commit", if commit { "1" } else { "0" }.to_string()),
        ]
    }

    pub fn azimuth_center(&self) -> AzimuthCenter {
        AzimuthCenter::from_index(self.azim_center as usize)
    }
}

/// Compass direction the azimuth servo centre points at.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AzimuthCenter {
    #[default]
    North,
    East,
    South,
    West,
}

impl AzimuthCenter {
    pub const ALL: [AzimuthCenter; 4] = [Self::North, Self::East, Self::South, Self::West];

    /// Unknown indices fall back to north.
    pub fn from_index(index: usize) -> Self {
        match index {
            1 => Self::East,
            2 => Self::South,
            3 => Self::West,
            _ => Self::North,
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::North => "North",
            Self::East => "East",
            Self::South => "South",
            Self::West => "West",
        }
    }

    /// Compass letters for the five bearing slider markers, left to right.
    pub fn bearing_labels(self) -> [char; 5] {
        let labels = match self {
            Self::North => "SWNES",
            Self::East => "WNESW",
            Self::South => "NESWN",
            Self::West => "ESWNE",
        };
        let mut out = [' '; 5];
        for (slot, c) in out.iter_mut().zip(labels.chars()) {
            *slot = c;
        }
        out
    }
}

/// Manual bearing/elevation override sent while a slider moves.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LiveTarget {
    pub bear: i32,
    pub elev: i32,
    pub azim_sff: Option<i32>,
}

impl LiveTarget {
    pub fn form(&self) -> FormFields {
        let mut fields = vec![("bear", self.bear.to_string()), ("elev", self.elev.to_string())];
        if let Some(sff) = self.azim_sff {
            fields.push(("azim_sff", sff.to_string()));
        }
        fields
    }
}

impl DeviceClient {
    /// Submit the AAT form. The device answers `Saved` or `Modified`.
    pub fn update_aat(&self, aat: &AatConfig, vbat: &VbatConfig, commit: bool) -> Result<String> {
        self.post_form(AAT_PATH, &aat.form(vbat, commit))
    }

    pub fn set_live_target(&self, target: &LiveTarget) -> Result<()> {
        self.post_form(AAT_PATH, &target.form())?;
        Ok(())
    }
}
