//! Byte-code lookup tables
//!
//! Every single-byte enumeration carried in a frame resolves through one of
//! these tables. Decoding is total: a byte that is not in a table becomes
//! `Unknown(code)`, whose name is `"UNKNOWN"`, and the raw code is kept so the
//! value can be written back unchanged.

use std::fmt;

use serde::{Serialize, Serializer};

/// Name reported for codes outside a table
pub const UNKNOWN: &str = "UNKNOWN";

macro_rules! code_table {
    (
        $(#[$meta:meta])*
        $name:ident {
            $($(#[$vmeta:meta])* $variant:ident = $code:literal => $label:literal,)+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($(#[$vmeta])* $variant,)+
            /// Code not present in the table
            Unknown(u8),
        }

        impl $name {
            /// Wire code of this value
            pub fn code(self) -> u8 {
                match self {
                    $(Self::$variant => $code,)+
                    Self::Unknown(code) => code,
                }
            }

            /// Protocol name, `"UNKNOWN"` for codes outside the table
            pub fn name(self) -> &'static str {
                match self {
                    $(Self::$variant => $label,)+
                    Self::Unknown(_) => UNKNOWN,
                }
            }

            /// Look up a value by protocol name (case-insensitive)
            pub fn from_name(name: &str) -> Option<Self> {
                $(
                    if name.eq_ignore_ascii_case($label) {
                        return Some(Self::$variant);
                    }
                )+
                None
            }

            /// Check if the code was found in the table
            pub fn is_known(self) -> bool {
                !matches!(self, Self::Unknown(_))
            }
        }

        impl From<u8> for $name {
            fn from(code: u8) -> Self {
                match code {
                    $($code => Self::$variant,)+
                    other => Self::Unknown(other),
                }
            }
        }

        impl From<$name> for u8 {
            fn from(value: $name) -> u8 {
                value.code()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.name())
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.name())
            }
        }
    };
}

code_table! {
    /// Real-time event category
    EventType {
        Card = 0x01 => "CARD",
        Face = 0x02 => "FACE",
        Fingerprint = 0x03 => "FINGERPRINT",
        Password = 0x04 => "PASSWORD",
        QrCode = 0x05 => "QR_CODE",
        Duress = 0x06 => "DURESS",
        Tailgating = 0x07 => "TAILGATING",
        AntiPassback = 0x08 => "ANTI_PASSBACK",
        DoorMagnetic = 0x09 => "DOOR_MAGNETIC",
        Alarm = 0x0A => "ALARM",
    }
}

code_table! {
    /// Credential used for a verification
    VerifyMethod {
        Card = 0x01 => "CARD",
        Face = 0x02 => "FACE",
        Finger = 0x03 => "FINGER",
        Password = 0x04 => "PASSWORD",
        Qr = 0x05 => "QR",
    }
}

code_table! {
    /// Outcome of a verification
    VerifyOutcome {
        Success = 0x00 => "SUCCESS",
        Failed = 0x01 => "FAILED",
        Timeout = 0x02 => "TIMEOUT",
        Invalid = 0x03 => "INVALID",
    }
}

code_table! {
    /// Liveness (anti-spoofing) verdict
    LivenessResult {
        Real = 0x01 => "REAL",
        Photo = 0x02 => "PHOTO",
        Video = 0x03 => "VIDEO",
        Mask = 0x04 => "MASK",
    }
}

code_table! {
    /// Door magnetic sensor state
    DoorStatus {
        Open = 0x01 => "OPEN",
        Closed = 0x02 => "CLOSE",
    }
}

code_table! {
    LockStatus {
        Locked = 0x01 => "LOCKED",
        Unlocked = 0x02 => "UNLOCKED",
        Fault = 0x03 => "FAULT",
    }
}

code_table! {
    /// Passage direction through an access point
    AccessDirection {
        In = 0x01 => "IN",
        Out = 0x02 => "OUT",
    }
}

code_table! {
    AccessLevel {
        Normal = 0x01 => "NORMAL",
        Vip = 0x02 => "VIP",
        Security = 0x03 => "SECURITY",
        Admin = 0x04 => "ADMIN",
    }
}

code_table! {
    /// Severity attached to error reports and alarms
    AlarmLevel {
        Low = 0x01 => "LOW",
        Medium = 0x02 => "MEDIUM",
        High = 0x03 => "HIGH",
        Critical = 0x04 => "CRITICAL",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_known_codes_resolve() {
        assert_eq!(VerifyMethod::from(0x02), VerifyMethod::Face);
        assert_eq!(VerifyOutcome::from(0x00).name(), "SUCCESS");
        assert_eq!(EventType::from(0x0A).name(), "ALARM");
        assert_eq!(DoorStatus::from(0x02).name(), "CLOSE");
    }

    #[test]
    fn test_unknown_code_keeps_raw_value() {
        let method = VerifyMethod::from(0x7F);
        assert_eq!(method, VerifyMethod::Unknown(0x7F));
        assert_eq!(method.name(), "UNKNOWN");
        assert_eq!(method.code(), 0x7F);
        assert!(!method.is_known());
    }

    #[test]
    fn test_every_table_is_total() {
        for code in 0..=u8::MAX {
            assert_eq!(AlarmLevel::from(code).code(), code);
            assert_eq!(LivenessResult::from(code).code(), code);
            assert_eq!(AccessDirection::from(code).code(), code);
        }
    }

    #[test]
    fn test_from_name() {
        assert_eq!(AccessLevel::from_name("vip"), Some(AccessLevel::Vip));
        assert_eq!(LockStatus::from_name("FAULT"), Some(LockStatus::Fault));
        assert_eq!(AccessLevel::from_name("ROOT"), None);
    }

    #[test]
    fn test_serializes_as_name() {
        let json = serde_json::to_string(&LockStatus::Unknown(9)).unwrap();
        assert_eq!(json, "\"UNKNOWN\"");
        let json = serde_json::to_string(&AccessDirection::Out).unwrap();
        assert_eq!(json, "\"OUT\"");
    }
}
