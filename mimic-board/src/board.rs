//! Emulated board
//!
//! Owns every peripheral of a board description and plays the host's part:
//! it moves bytes between each USART and the sensor wired to it, routes I2C
//! transactions by address, forwards timer ticks and resets everything
//! together.

use std::collections::BTreeMap;
use std::path::Path;

use mimic_display::Sh1106;
use mimic_hal::{Clocked, I2cPeripheral, ReadBuffer, Resettable, UartDevice};
use mimic_hal_stm32::{Stm32Usart, RX_FIFO_SIZE};
use mimic_sensors::{Pms5003, S8lp, Sgp41, Sht31};
use tracing::{debug, info, trace};

use crate::config::BoardConfig;
use crate::error::{BusError, ConfigError};

/// A USART and its name in the board description
struct Port {
    name: String,
    usart: Stm32Usart,
}

/// A UART sensor and the port it is wired to
struct Wired<D> {
    port: usize,
    device: D,
}

/// Device answering at an I2C address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum I2cTarget {
    Sgp41,
    Sht31,
    Sh1106,
}

/// Emulated board
pub struct Board {
    ports: Vec<Port>,
    pms5003: Option<Wired<Pms5003>>,
    s8lp: Option<Wired<S8lp>>,
    sgp41: Option<Sgp41>,
    sht31: Option<Sht31>,
    sh1106: Option<Box<Sh1106>>,
    i2c: BTreeMap<u8, I2cTarget>,
}

impl Board {
    /// Build every peripheral of a board description
    pub fn from_config(config: &BoardConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let ports: Vec<Port> = config
            .uarts
            .iter()
            .map(|c| Port {
                name: c.name.to_string(),
                usart: Stm32Usart::new(c.frequency),
            })
            .collect();
        let port = |device: &'static str, uart: &str| {
            ports
                .iter()
                .position(|p| p.name == uart)
                .ok_or_else(|| ConfigError::UnknownUart {
                    device,
                    uart: uart.to_string(),
                })
        };

        let pms5003 = match &config.pms5003 {
            Some(c) => Some(Wired {
                port: port("pms5003", c.uart.as_str())?,
                device: Pms5003::new(c),
            }),
            None => None,
        };
        let s8lp = match &config.s8lp {
            Some(c) => Some(Wired {
                port: port("s8lp", c.uart.as_str())?,
                device: S8lp::new(c),
            }),
            None => None,
        };

        let mut i2c = BTreeMap::new();
        let sgp41 = config.sgp41.as_ref().map(|c| {
            i2c.insert(c.address, I2cTarget::Sgp41);
            Sgp41::new(c)
        });
        let sht31 = match &config.sht31 {
            Some(c) => {
                let sensor =
                    Sht31::new(c).map_err(|_| ConfigError::OutOfRange("temperature or humidity"))?;
                i2c.insert(c.address, I2cTarget::Sht31);
                Some(sensor)
            }
            None => None,
        };
        let sh1106 = match &config.sh1106 {
            Some(c) => {
                let display = Box::new(Sh1106::new(c)?);
                i2c.insert(c.address, I2cTarget::Sh1106);
                Some(display)
            }
            None => None,
        };

        info!(
            "Board ready: {} uarts, {} i2c devices",
            ports.len(),
            i2c.len()
        );

        Ok(Self {
            ports,
            pms5003,
            s8lp,
            sgp41,
            sht31,
            sh1106,
            i2c,
        })
    }

    /// Build a board from TOML text
    pub fn from_toml_str(toml_str: &str) -> Result<Self, ConfigError> {
        Self::from_config(&BoardConfig::from_toml_str(toml_str)?)
    }

    /// Build a board from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_config(&BoardConfig::load(path)?)
    }

    /// USART by name
    pub fn usart(&self, name: &str) -> Option<&Stm32Usart> {
        self.ports.iter().find(|p| p.name == name).map(|p| &p.usart)
    }

    /// USART by name, for register access
    ///
    /// Call [`pump`](Self::pump) after writing DR to deliver the bytes.
    pub fn usart_mut(&mut self, name: &str) -> Option<&mut Stm32Usart> {
        self.ports
            .iter_mut()
            .find(|p| p.name == name)
            .map(|p| &mut p.usart)
    }

    pub fn pms5003(&self) -> Option<&Pms5003> {
        self.pms5003.as_ref().map(|w| &w.device)
    }

    pub fn pms5003_mut(&mut self) -> Option<&mut Pms5003> {
        self.pms5003.as_mut().map(|w| &mut w.device)
    }

    pub fn s8lp(&self) -> Option<&S8lp> {
        self.s8lp.as_ref().map(|w| &w.device)
    }

    pub fn s8lp_mut(&mut self) -> Option<&mut S8lp> {
        self.s8lp.as_mut().map(|w| &mut w.device)
    }

    pub fn sgp41(&self) -> Option<&Sgp41> {
        self.sgp41.as_ref()
    }

    pub fn sgp41_mut(&mut self) -> Option<&mut Sgp41> {
        self.sgp41.as_mut()
    }

    pub fn sht31(&self) -> Option<&Sht31> {
        self.sht31.as_ref()
    }

    pub fn sht31_mut(&mut self) -> Option<&mut Sht31> {
        self.sht31.as_mut()
    }

    pub fn sh1106(&self) -> Option<&Sh1106> {
        self.sh1106.as_deref()
    }

    /// Exchange pending bytes on every UART link
    ///
    /// Bytes the firmware wrote to a USART reach its sensor; the sensor's
    /// answer lands in the USART receive FIFO as far as it has room.
    pub fn pump(&mut self) {
        if let Some(wired) = &mut self.pms5003 {
            exchange(&mut self.ports[wired.port].usart, &mut wired.device);
        }
        if let Some(wired) = &mut self.s8lp {
            exchange(&mut self.ports[wired.port].usart, &mut wired.device);
        }
    }

    /// Advance the board clock, then deliver any output it caused
    pub fn tick(&mut self, ticks: u32) {
        if let Some(wired) = &mut self.pms5003 {
            wired.device.tick(ticks);
        }
        self.pump();
    }

    /// Reset every peripheral
    pub fn reset(&mut self) {
        debug!("Board reset");
        for port in &mut self.ports {
            port.usart.reset();
        }
        if let Some(wired) = &mut self.pms5003 {
            wired.device.reset();
        }
        if let Some(wired) = &mut self.s8lp {
            wired.device.reset();
        }
        if let Some(sensor) = &mut self.sgp41 {
            sensor.reset();
        }
        if let Some(sensor) = &mut self.sht31 {
            sensor.reset();
        }
        if let Some(display) = &mut self.sh1106 {
            display.reset();
        }
    }

    /// I2C write transaction
    pub fn i2c_write(&mut self, address: u8, data: &[u8]) -> Result<(), BusError> {
        trace!("i2c {:#04x} write {:?}", address, data);
        self.target(address)?.write(data);
        Ok(())
    }

    /// I2C read transaction
    pub fn i2c_read(&mut self, address: u8, count: usize) -> Result<ReadBuffer, BusError> {
        let data = self.target(address)?.read(count);
        trace!("i2c {:#04x} read {:?}", address, &data[..]);
        Ok(data)
    }

    /// I2C STOP condition
    pub fn i2c_finish(&mut self, address: u8) -> Result<(), BusError> {
        self.target(address)?.finish_transmission();
        Ok(())
    }

    fn target(&mut self, address: u8) -> Result<&mut dyn I2cPeripheral, BusError> {
        let target = self.i2c.get(&address).copied();
        let device: Option<&mut dyn I2cPeripheral> = match target {
            Some(I2cTarget::Sgp41) => self.sgp41.as_mut().map(|d| d as &mut dyn I2cPeripheral),
            Some(I2cTarget::Sht31) => self.sht31.as_mut().map(|d| d as &mut dyn I2cPeripheral),
            Some(I2cTarget::Sh1106) => self.sh1106.as_deref_mut().map(|d| d as &mut dyn I2cPeripheral),
            None => None,
        };
        device.ok_or(BusError::Nack(address))
    }
}

/// Move bytes both ways between a USART and the device on its line
fn exchange(usart: &mut Stm32Usart, device: &mut dyn UartDevice) {
    while let Some(byte) = usart.transmit_byte() {
        device.receive_byte(byte);
    }
    while usart.rx_pending() < RX_FIFO_SIZE {
        match device.transmit_byte() {
            Some(byte) => usart.receive_byte(byte),
            None => break,
        }
    }
}
