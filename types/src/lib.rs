pub type DmaAddress = u64;

#[repr(u32)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub enum Command {
    #[default]
    Disable = 0,
    Enable = 1,
}

impl Command {
    pub fn is_enabled(self) -> bool {
        matches!(self, Self::Enable)
    }
}

#[repr(u8)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub enum YuvRange {
    #[default]
    Full = 0,
    Narrow = 1,
}

#[repr(u32)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub enum Format {
    #[default]
    Bayer10 = 0,
    Bayer12 = 1,
    Yuv422Full = 2,
    Yuv422Narrow = 3,
    Yuv420Full = 4,
    Yuv420Narrow = 5,
    Rgb = 6,
}

impl Format {
    pub fn range(self) -> Option<YuvRange> {
        match self {
            Self::Yuv422Full | Self::Yuv420Full => Some(YuvRange::Full),
            Self::Yuv422Narrow | Self::Yuv420Narrow => Some(YuvRange::Narrow),
            Self::Bayer10 | Self::Bayer12 | Self::Rgb => None,
        }
    }

    /// Returns the same layout encoded with the given range, non-YUV formats are unchanged.
    pub fn with_range(self, range: YuvRange) -> Self {
        match (self, range) {
            (Self::Yuv422Full | Self::Yuv422Narrow, YuvRange::Full) => Self::Yuv422Full,
            (Self::Yuv422Full | Self::Yuv422Narrow, YuvRange::Narrow) => Self::Yuv422Narrow,
            (Self::Yuv420Full | Self::Yuv420Narrow, YuvRange::Full) => Self::Yuv420Full,
            (Self::Yuv420Full | Self::Yuv420Narrow, YuvRange::Narrow) => Self::Yuv420Narrow,
            (format, _) => format,
        }
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub struct Control {
    pub command: Command,
    pub bypass: bool,
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub struct OtfInput {
    pub command: Command,
    pub width: u32,
    pub height: u32,
    pub format: Format,
    pub crop: Rect,
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub struct DmaInput {
    pub command: Command,
    pub width: u32,
    pub height: u32,
    pub format: Format,
    pub planes: u32,
    pub crop: Rect,
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub struct OtfOutput {
    pub command: Command,
    pub width: u32,
    pub height: u32,
    pub format: Format,
    pub crop: Rect,
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub struct DmaOutput {
    pub command: Command,
    pub width: u32,
    pub height: u32,
    pub format: Format,
    pub planes: u32,
    pub crop: Rect,
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub struct OutputRange {
    pub range: YuvRange,
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub struct VisionRoi {
    pub command: Command,
    pub roi: Rect,
}

/// Frame size and crop a downstream block reports to its on-the-fly predecessor.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub struct Geometry {
    pub width: u32,
    pub height: u32,
    pub crop: Rect,
}
