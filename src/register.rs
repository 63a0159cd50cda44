//! ADV7393 register map
//!
//! Register addresses and power-on values for the ADV7393 video encoder's
//! standard-definition path. Registers are a flat 8-bit address space
//! reached over I2C; every register holds one byte.
//!
//! ## Register Groups
//!
//! | Range         | Group                                  |
//! |---------------|----------------------------------------|
//! | `0x00..=0x17` | Power, mode select, DAC, reset         |
//! | `0x80..=0x8B` | SD mode and timing                     |
//! | `0x8C..=0x8F` | Subcarrier frequency (little-endian)   |
//! | `0x90..=0xBB` | Phase, closed captions, scaling, gamma |
//!
//! ## Example
//!
//! ```
//! use ntsc_overlay::{register, RegisterInterface};
//! # struct MockBus;
//! # impl RegisterInterface for MockBus {
//! #     type Error = core::convert::Infallible;
//! #     fn read_register(&mut self, _reg: u8) -> Result<u8, Self::Error> { Ok(0) }
//! #     fn write_register(&mut self, _reg: u8, _value: u8) -> Result<(), Self::Error> { Ok(()) }
//! # }
//! # let mut bus = MockBus;
//! // Enable the SD colour bar generator by hand
//! let _ = bus.write_register(register::SD_MODE_4, 0x40);
//! let _ = bus.read_register(register::SD_FSC_0);
//! ```

/// 7-bit I2C address (ALSB pin low; `0x54` in 8-bit write form)
pub const I2C_ADDRESS: u8 = 0x2A;

// General control

/// Power mode (0x00)
pub const POWER_MODE: u8 = 0x00;
/// Mode select (0x01)
pub const MODE_SELECT: u8 = 0x01;
/// Mode register 0 (0x02)
pub const MODE_0: u8 = 0x02;
/// DAC output level (0x0B)
pub const DAC_OUTPUT_LEVEL: u8 = 0x0B;
/// DAC power mode (0x0D)
pub const DAC_POWER_MODE: u8 = 0x0D;
/// Cable detection (0x10)
pub const CABLE_DETECT: u8 = 0x10;
/// Pixel port readback A (0x13)
pub const PIXEL_PORT_READBACK_A: u8 = 0x13;
/// Pixel port readback B (0x14)
pub const PIXEL_PORT_READBACK_B: u8 = 0x14;
/// Control port readback (0x16)
pub const CONTROL_PORT_READBACK: u8 = 0x16;

/// Software reset (0x17)
///
/// Bit 1 resets the device and clears itself.
pub const SOFTWARE_RESET: u8 = 0x17;

// SD mode and timing

/// SD mode register 1 (0x80)
pub const SD_MODE_1: u8 = 0x80;

/// SD mode register 2 (0x82)
///
/// Bit 6 marks pixel data valid.
pub const SD_MODE_2: u8 = 0x82;

/// SD mode register 3 (0x83)
pub const SD_MODE_3: u8 = 0x83;

/// SD mode register 4 (0x84)
///
/// Bit 6 enables the internal colour bar generator.
pub const SD_MODE_4: u8 = 0x84;

/// SD mode register 5 (0x86)
pub const SD_MODE_5: u8 = 0x86;

/// SD mode register 6 (0x87)
///
/// Bit 7 enables RGB input.
pub const SD_MODE_6: u8 = 0x87;

/// SD mode register 7 (0x88)
///
/// Bit 1 selects non-interlaced mode, bits 3..=4 the input format.
pub const SD_MODE_7: u8 = 0x88;

/// SD mode register 8 (0x89)
pub const SD_MODE_8: u8 = 0x89;

/// SD timing register 0 (0x8A)
///
/// Bit 0 selects master (1) or slave (0), bits 1..=2 the timing mode.
pub const SD_TIMING_0: u8 = 0x8A;

/// SD timing register 1 (0x8B)
pub const SD_TIMING_1: u8 = 0x8B;

// Subcarrier

/// Subcarrier frequency byte 0, least significant (0x8C)
pub const SD_FSC_0: u8 = 0x8C;
/// Subcarrier frequency byte 1 (0x8D)
pub const SD_FSC_1: u8 = 0x8D;
/// Subcarrier frequency byte 2 (0x8E)
pub const SD_FSC_2: u8 = 0x8E;
/// Subcarrier frequency byte 3, most significant (0x8F)
pub const SD_FSC_3: u8 = 0x8F;

/// Subcarrier frequency registers in byte order
pub const SD_FSC: [u8; 4] = [SD_FSC_0, SD_FSC_1, SD_FSC_2, SD_FSC_3];

/// Subcarrier phase (0x90)
pub const SD_FSC_PHASE: u8 = 0x90;

// Closed captions, pedestal, WSS

/// Closed caption extended data byte 1 (0x91)
pub const SD_CLOSED_CAPTION_0: u8 = 0x91;
/// Closed caption extended data byte 2 (0x92)
pub const SD_CLOSED_CAPTION_1: u8 = 0x92;
/// Closed caption data byte 1 (0x93)
pub const SD_CLOSED_CAPTION_2: u8 = 0x93;
/// Closed caption data byte 2 (0x94)
pub const SD_CLOSED_CAPTION_3: u8 = 0x94;
/// Pedestal control 0 (0x95)
pub const SD_PEDESTAL_0: u8 = 0x95;
/// Pedestal control 1 (0x96)
pub const SD_PEDESTAL_1: u8 = 0x96;
/// Pedestal control 2 (0x97)
pub const SD_PEDESTAL_2: u8 = 0x97;
/// Pedestal control 3 (0x98)
pub const SD_PEDESTAL_3: u8 = 0x98;
/// CGMS/WSS 0 (0x99)
pub const SD_CGMS_WSS_0: u8 = 0x99;
/// CGMS/WSS 1 (0x9A)
pub const SD_CGMS_WSS_1: u8 = 0x9A;
/// CGMS/WSS 2 (0x9B)
pub const SD_CGMS_WSS_2: u8 = 0x9B;

// Picture adjustment

/// Scale LSBs (0x9C)
pub const SD_SCALE_LSB: u8 = 0x9C;
/// Y scale (0x9D)
pub const SD_SCALE_Y: u8 = 0x9D;
/// Cb scale (0x9E)
pub const SD_SCALE_CB: u8 = 0x9E;
/// Cr scale (0x9F)
pub const SD_SCALE_CR: u8 = 0x9F;
/// Hue adjust (0xA0)
pub const SD_HUE_ADJUST: u8 = 0xA0;
/// Brightness / WSS (0xA1)
pub const SD_BRIGHTNESS_WSS: u8 = 0xA1;
/// Luma SSAF (0xA2)
pub const SD_LUMA_SSAF: u8 = 0xA2;
/// Digital noise reduction 0 (0xA3)
pub const SD_DNR_0: u8 = 0xA3;
/// Digital noise reduction 1 (0xA4)
pub const SD_DNR_1: u8 = 0xA4;
/// Digital noise reduction 2 (0xA5)
pub const SD_DNR_2: u8 = 0xA5;
/// First gamma curve A coefficient (0xA6..=0xAF)
pub const SD_GAMMA_A0: u8 = 0xA6;
/// First gamma curve B coefficient (0xB0..=0xB9)
pub const SD_GAMMA_B0: u8 = 0xB0;
/// Brightness detect (0xBA)
pub const SD_BRIGHTNESS_DETECT: u8 = 0xBA;
/// Field count (0xBB)
pub const SD_FIELD_COUNT: u8 = 0xBB;

/// Power-on register values
pub mod reset {
    /// [`POWER_MODE`](super::POWER_MODE) after reset
    pub const POWER_MODE: u8 = 0x12;
    /// [`MODE_SELECT`](super::MODE_SELECT) after reset
    pub const MODE_SELECT: u8 = 0x00;
    /// [`MODE_0`](super::MODE_0) after reset
    pub const MODE_0: u8 = 0x20;
    /// [`DAC_OUTPUT_LEVEL`](super::DAC_OUTPUT_LEVEL) after reset
    pub const DAC_OUTPUT_LEVEL: u8 = 0x00;
    /// [`DAC_POWER_MODE`](super::DAC_POWER_MODE) after reset
    pub const DAC_POWER_MODE: u8 = 0x00;
    /// [`CABLE_DETECT`](super::CABLE_DETECT) after reset
    pub const CABLE_DETECT: u8 = 0x00;
    /// [`SOFTWARE_RESET`](super::SOFTWARE_RESET) after reset
    pub const SOFTWARE_RESET: u8 = 0x00;
    /// [`SD_MODE_1`](super::SD_MODE_1) after reset
    pub const SD_MODE_1: u8 = 0x10;
    /// [`SD_MODE_2`](super::SD_MODE_2) after reset
    pub const SD_MODE_2: u8 = 0x0B;
    /// [`SD_MODE_3`](super::SD_MODE_3) after reset
    pub const SD_MODE_3: u8 = 0x04;
    /// [`SD_MODE_4`](super::SD_MODE_4) after reset
    pub const SD_MODE_4: u8 = 0x00;
    /// [`SD_MODE_5`](super::SD_MODE_5) after reset
    pub const SD_MODE_5: u8 = 0x02;
    /// [`SD_MODE_6`](super::SD_MODE_6) after reset
    pub const SD_MODE_6: u8 = 0x00;
    /// [`SD_MODE_7`](super::SD_MODE_7) after reset
    pub const SD_MODE_7: u8 = 0x00;
    /// [`SD_MODE_8`](super::SD_MODE_8) after reset
    pub const SD_MODE_8: u8 = 0x00;
    /// [`SD_TIMING_0`](super::SD_TIMING_0) after reset
    pub const SD_TIMING_0: u8 = 0x08;
    /// [`SD_TIMING_1`](super::SD_TIMING_1) after reset
    pub const SD_TIMING_1: u8 = 0x00;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subcarrier_registers_are_contiguous() {
        for (offset, reg) in SD_FSC.iter().enumerate() {
            assert_eq!(*reg as usize, SD_FSC_0 as usize + offset);
        }
    }

    #[test]
    fn test_i2c_address_matches_8bit_form() {
        assert_eq!(I2C_ADDRESS << 1, 0x54);
    }
}
