/// Declares a closed string enum together with its wire names and its
/// display metadata, so every view reads labels and tones from one table.
///
/// Each variant line is `Variant => "wire-name", "Label", Tone;`.
macro_rules! string_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $( $variant:ident => $wire:literal, $label:literal, $tone:ident; )+
        }
    ) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord,
            serde::Serialize, serde::Deserialize,
        )]
        pub enum $name {
            $(
                #[serde(rename = $wire)]
                $variant,
            )+
        }

        impl $name {
            /// Every variant, in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Wire names accepted by `FromStr`.
            pub const WIRE_NAMES: &'static [&'static str] = &[$($wire),+];

            pub const fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $wire,)+
                }
            }
        }

        impl $crate::enums::DisplayMeta for $name {
            fn label(&self) -> &'static str {
                match self {
                    $($name::$variant => $label,)+
                }
            }

            fn tone(&self) -> $crate::enums::Tone {
                match self {
                    $($name::$variant => $crate::enums::Tone::$tone,)+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = $crate::error::EstateError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($wire => Ok($name::$variant),)+
                    other => Err($crate::error::EstateError::Validation(format!(
                        "unknown {} value: {:?}",
                        stringify!($name),
                        other
                    ))),
                }
            }
        }
    };
}
