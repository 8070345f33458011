use crate::device::Hwip;
use crate::interrupt;
use crate::parameters;
use crate::properties;
use crate::register;

macro_rules! blocks {
    ($($module:ident),+) => {
        paste::paste! {
            $(
                pub mod $module;
            )+

            #[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
            pub enum Kind {
                $(
                    #[serde(rename = "" $module)]
                    [<$module:camel>],
                )+
            }

            impl std::fmt::Display for Kind {
                fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                    match self {
                        $(
                            Self::[<$module:camel>] => write!(formatter, stringify!($module)),
                        )+
                    }
                }
            }

            impl Kind {
                pub const ALL: &'static [Kind] = &[
                    $(
                        Kind::[<$module:camel>],
                    )+
                ];

                pub const COUNT: usize = Self::ALL.len();

                pub fn index(self) -> usize {
                    self as usize
                }

                pub fn name(self) -> &'static str {
                    self.properties().name
                }

                pub fn properties(self) -> properties::Block {
                    match self {
                        $(
                            Self::[<$module:camel>] => $module::Block::PROPERTIES,
                        )+
                    }
                }

                pub fn interrupt_events(
                    self,
                    window: &dyn register::Window,
                    source: interrupt::HandlerSlot,
                ) -> interrupt::Events {
                    match self {
                        $(
                            Self::[<$module:camel>] => $module::Block::interrupt_events(window, source),
                        )+
                    }
                }

                pub fn correct_chroma_range(
                    self,
                    parameters: &mut parameters::Parameters,
                    range: isp_types::YuvRange,
                ) {
                    match self {
                        $(
                            Self::[<$module:camel>] => $module::Block::correct_chroma_range(parameters, range),
                        )+
                    }
                }
            }

            #[derive(Debug, PartialEq, Eq)]
            pub struct ParseKindError {
                on: String
            }

            impl std::fmt::Display for ParseKindError {
                fn fmt(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
                    write!(formatter, "unknown block kind \"{}\"", self.on)
                }
            }

            impl std::error::Error for ParseKindError {}

            impl std::str::FromStr for Kind {
                type Err = ParseKindError;

                fn from_str(string: &str) -> Result<Self, Self::Err> {
                    match string {
                        $(
                            stringify!($module) => Ok(Self::[<$module:camel>]),
                        )+
                        _ => Err(Self::Err {on: string.to_owned()}),
                    }
                }
            }
        }
    };
}

blocks! { capture, bayer, isp, temporal, scaler, vision }
