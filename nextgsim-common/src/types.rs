//! Shared identifiers

use std::fmt;

use serde::{Deserialize, Serialize};

/// Public Land Mobile Network identifier.
///
/// MCC is always 3 decimal digits, MNC is 2 or 3 digits depending on
/// `long_mnc`.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Plmn {
    /// Mobile Country Code (0-999)
    pub mcc: u16,
    /// Mobile Network Code (0-99, or 0-999 when `long_mnc`)
    pub mnc: u16,
    /// True if MNC is 3 digits
    pub long_mnc: bool,
}

impl Plmn {
    pub const fn new(mcc: u16, mnc: u16, long_mnc: bool) -> Self {
        Self { mcc, mnc, long_mnc }
    }

    /// Returns true if MCC and MNC fit their digit counts.
    pub fn is_valid(&self) -> bool {
        let mnc_max = if self.long_mnc { 999 } else { 99 };
        self.mcc <= 999 && self.mnc <= mnc_max
    }

    /// Encodes the PLMN as 3 TBCD octets (3GPP TS 24.008).
    ///
    /// ```text
    /// octet 1: MCC digit 2 | MCC digit 1
    /// octet 2: MNC digit 3 (or 0xF) | MCC digit 3
    /// octet 3: MNC digit 2 | MNC digit 1
    /// ```
    pub fn encode(&self) -> [u8; 3] {
        let mcc = [
            (self.mcc / 100 % 10) as u8,
            (self.mcc / 10 % 10) as u8,
            (self.mcc % 10) as u8,
        ];
        let mnc = if self.long_mnc {
            [
                (self.mnc / 100 % 10) as u8,
                (self.mnc / 10 % 10) as u8,
                (self.mnc % 10) as u8,
            ]
        } else {
            [(self.mnc / 10 % 10) as u8, (self.mnc % 10) as u8, 0x0F]
        };

        [
            (mcc[1] << 4) | mcc[0],
            (mnc[2] << 4) | mcc[2],
            (mnc[1] << 4) | mnc[0],
        ]
    }

    /// Decodes a PLMN from 3 TBCD octets.
    pub fn decode(bytes: [u8; 3]) -> Self {
        let digit = |octet: u8, high: bool| -> u16 {
            if high {
                u16::from(octet >> 4)
            } else {
                u16::from(octet & 0x0F)
            }
        };

        let mcc = 100 * digit(bytes[0], false) + 10 * digit(bytes[0], true) + digit(bytes[1], false);
        let mnc1 = digit(bytes[2], false);
        let mnc2 = digit(bytes[2], true);
        let mnc3 = digit(bytes[1], true);

        if mnc3 == 0x0F {
            Self::new(mcc, 10 * mnc1 + mnc2, false)
        } else {
            Self::new(mcc, 100 * mnc1 + 10 * mnc2 + mnc3, true)
        }
    }
}

impl fmt::Debug for Plmn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Plmn({self})")
    }
}

impl fmt::Display for Plmn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.long_mnc {
            write!(f, "{:03}-{:03}", self.mcc, self.mnc)
        } else {
            write!(f, "{:03}-{:02}", self.mcc, self.mnc)
        }
    }
}
