//! Encoder register bus abstraction
//!
//! This module provides the [`RegisterInterface`] trait and the
//! [`I2cInterface`] struct for reaching the ADV7393 register file.
//!
//! ## Hardware Requirements
//!
//! The ADV7393 is configured over I2C:
//! - SDA + SCL, standard or fast mode
//! - 7-bit address `0x2A` (ALSB low) or `0x2B` (ALSB high)
//!
//! Each register access is a single-byte transfer: writes send
//! `[register, value]`, reads send `[register]` then read one byte with a
//! repeated start.
//!
//! ## Example
//!
//! ```
//! use embedded_hal::i2c::{I2c, Operation, SevenBitAddress};
//! use ntsc_overlay::{I2cInterface, RegisterInterface};
//! # use core::convert::Infallible;
//! # struct MockI2c;
//! # impl embedded_hal::i2c::ErrorType for MockI2c { type Error = Infallible; }
//! # impl I2c<SevenBitAddress> for MockI2c {
//! #     fn transaction(
//! #         &mut self,
//! #         _address: u8,
//! #         _operations: &mut [Operation<'_>],
//! #     ) -> Result<(), Self::Error> {
//! #         Ok(())
//! #     }
//! # }
//! let mut bus = I2cInterface::new(MockI2c);
//!
//! // Read the power mode register
//! let _ = bus.read_register(0x00);
//!
//! // Software reset
//! let _ = bus.write_register(0x17, 0x02);
//! ```

use core::fmt::Debug;
use embedded_hal::i2c::{I2c, SevenBitAddress};

use crate::register;

type InterfaceResult<T, E> = core::result::Result<T, E>;

/// Byte-wide register access to the video encoder
///
/// This trait abstracts over the bus so that the
/// [`Adv7393`](crate::encoder::Adv7393) driver works with any transport,
/// and so tests can substitute an in-memory register file.
///
/// ## Implementing
///
/// For most cases, use the provided [`I2cInterface`]. Implement this trait
/// on your own type for a shared bus manager or a different transport.
pub trait RegisterInterface {
    /// Error type for bus operations
    ///
    /// Must implement [`Debug`] for error reporting.
    type Error: Debug;

    /// Read one register
    ///
    /// # Errors
    ///
    /// Returns an error if the bus transfer fails or is not acknowledged.
    fn read_register(&mut self, reg: u8) -> InterfaceResult<u8, Self::Error>;

    /// Write one register
    ///
    /// # Errors
    ///
    /// Returns an error if the bus transfer fails or is not acknowledged.
    fn write_register(&mut self, reg: u8, value: u8) -> InterfaceResult<(), Self::Error>;
}

/// Errors that can occur at the interface level
#[derive(Debug)]
pub enum InterfaceError<I2cErr> {
    /// I2C transfer error
    I2c(I2cErr),
}

impl<I2cErr: Debug> core::fmt::Display for InterfaceError<I2cErr> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::I2c(e) => write!(f, "I2C error: {e:?}"),
        }
    }
}

impl<I2cErr: Debug> core::error::Error for InterfaceError<I2cErr> {}

/// I2C register interface
///
/// Implements [`RegisterInterface`] for an embedded-hal v1.0 [`I2c`] bus.
///
/// ## Type Parameters
///
/// * `I2C` - Bus implementing [`I2c`] with 7-bit addressing
pub struct I2cInterface<I2C> {
    /// I2C bus
    i2c: I2C,
    /// 7-bit device address
    address: SevenBitAddress,
}

impl<I2C> I2cInterface<I2C>
where
    I2C: I2c<SevenBitAddress>,
{
    /// Create an interface at the default address [`register::I2C_ADDRESS`]
    pub fn new(i2c: I2C) -> Self {
        Self::with_address(i2c, register::I2C_ADDRESS)
    }

    /// Create an interface at a specific 7-bit address
    pub fn with_address(i2c: I2C, address: SevenBitAddress) -> Self {
        Self { i2c, address }
    }

    /// Get the 7-bit device address
    pub fn address(&self) -> SevenBitAddress {
        self.address
    }

    /// Release the underlying bus
    pub fn release(self) -> I2C {
        self.i2c
    }
}

impl<I2C> RegisterInterface for I2cInterface<I2C>
where
    I2C: I2c<SevenBitAddress>,
    I2C::Error: Debug,
{
    type Error = InterfaceError<I2C::Error>;

    fn read_register(&mut self, reg: u8) -> InterfaceResult<u8, Self::Error> {
        let mut value = [0u8];
        self.i2c
            .write_read(self.address, &[reg], &mut value)
            .map_err(InterfaceError::I2c)?;
        Ok(value[0])
    }

    fn write_register(&mut self, reg: u8, value: u8) -> InterfaceResult<(), Self::Error> {
        self.i2c
            .write(self.address, &[reg, value])
            .map_err(InterfaceError::I2c)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;
    use embedded_hal::i2c::{ErrorKind, ErrorType, NoAcknowledgeSource, Operation};

    #[derive(Debug, Clone, Copy, PartialEq)]
    struct MockError;

    impl embedded_hal::i2c::Error for MockError {
        fn kind(&self) -> ErrorKind {
            ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address)
        }
    }

    /// Records written bytes and answers reads from a fixed register file
    struct MockI2c {
        registers: [u8; 256],
        writes: Vec<(u8, Vec<u8>)>,
        present: bool,
    }

    impl MockI2c {
        fn new() -> Self {
            Self {
                registers: [0; 256],
                writes: Vec::new(),
                present: true,
            }
        }
    }

    impl ErrorType for MockI2c {
        type Error = MockError;
    }

    impl I2c<SevenBitAddress> for MockI2c {
        fn transaction(
            &mut self,
            address: u8,
            operations: &mut [Operation<'_>],
        ) -> Result<(), Self::Error> {
            if !self.present {
                return Err(MockError);
            }
            let mut pointer = 0usize;
            for op in operations {
                match op {
                    Operation::Write(bytes) => {
                        self.writes.push((address, bytes.to_vec()));
                        if let Some(&reg) = bytes.first() {
                            pointer = reg as usize;
                        }
                        if let [reg, value] = bytes {
                            self.registers[*reg as usize] = *value;
                        }
                    }
                    Operation::Read(buf) => {
                        for byte in buf.iter_mut() {
                            *byte = self.registers[pointer];
                        }
                    }
                }
            }
            Ok(())
        }
    }

    #[test]
    fn test_default_address() {
        let bus = I2cInterface::new(MockI2c::new());
        assert_eq!(bus.address(), 0x2A);
    }

    #[test]
    fn test_write_sends_register_then_value() {
        let mut bus = I2cInterface::new(MockI2c::new());
        bus.write_register(0x17, 0x02).unwrap();
        let i2c = bus.release();
        assert_eq!(i2c.writes, alloc::vec![(0x2A, alloc::vec![0x17, 0x02])]);
    }

    #[test]
    fn test_read_uses_register_pointer() {
        let mut i2c = MockI2c::new();
        i2c.registers[0x8C] = 0x1F;
        let mut bus = I2cInterface::with_address(i2c, 0x2B);
        assert_eq!(bus.read_register(0x8C).unwrap(), 0x1F);
        let i2c = bus.release();
        assert_eq!(i2c.writes, alloc::vec![(0x2B, alloc::vec![0x8C])]);
    }

    #[test]
    fn test_missing_device_reports_error() {
        let mut i2c = MockI2c::new();
        i2c.present = false;
        let mut bus = I2cInterface::new(i2c);
        assert!(matches!(
            bus.write_register(0x00, 0x00),
            Err(InterfaceError::I2c(MockError))
        ));
        assert!(bus.read_register(0x00).is_err());
    }
}
