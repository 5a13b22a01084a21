//! STM32 USART register file
//!
//! Models the legacy (F1/F4) USART layout. Only the fields firmware
//! actually depends on are live; everything else reads back as written or
//! as zero.
//!
//! SR.RXNE and SR.TC are write-zero-to-clear: writing 1 leaves them alone.
//! SR.TXE is always set, since transmission completes instantly. The IRQ
//! line is recomputed after every access that can change a flag or an
//! enable bit.

use heapless::Deque;
use mimic_hal::uart::{DataBits, Parity, StopBits};
use mimic_hal::{IrqLine, OutputPin, Resettable, UartConfig, UartDevice};

/// Size of the register window
pub const WINDOW_SIZE: u32 = 0x400;

/// Receive FIFO depth
pub const RX_FIFO_SIZE: usize = 64;

/// Transmit queue depth
pub const TX_QUEUE_SIZE: usize = 64;

/// Register offsets
pub mod reg {
    /// Status
    pub const SR: u32 = 0x00;
    /// Data
    pub const DR: u32 = 0x04;
    /// Baud rate divisor
    pub const BRR: u32 = 0x08;
    /// Control 1
    pub const CR1: u32 = 0x0C;
    /// Control 2
    pub const CR2: u32 = 0x10;
}

/// SR bits
pub mod sr {
    /// Overrun (never set)
    pub const ORE: u32 = 1 << 3;
    /// Read data register not empty
    pub const RXNE: u32 = 1 << 5;
    /// Transmission complete
    pub const TC: u32 = 1 << 6;
    /// Transmit data register empty (always set)
    pub const TXE: u32 = 1 << 7;
    /// Value after reset
    pub const RESET: u32 = TC | TXE;
}

/// CR1 bits
pub mod cr1 {
    pub const RE: u32 = 1 << 2;
    pub const TE: u32 = 1 << 3;
    pub const RXNEIE: u32 = 1 << 5;
    pub const TCIE: u32 = 1 << 6;
    pub const TXEIE: u32 = 1 << 7;
    /// Parity selection (set = odd)
    pub const PS: u32 = 1 << 9;
    pub const PCE: u32 = 1 << 10;
    /// Word length (set = 9 data bits)
    pub const M: u32 = 1 << 12;
    pub const UE: u32 = 1 << 13;
    /// Oversampling by 8
    pub const OVER8: u32 = 1 << 15;
    /// Implemented bits
    pub const MASK: u32 = 0xBFFF;
}

/// CR2 fields
pub mod cr2 {
    pub const STOP_SHIFT: u32 = 12;
    pub const STOP_MASK: u32 = 0b11 << STOP_SHIFT;
    /// Implemented bits
    pub const MASK: u32 = 0x7F5F;
}

/// DR holds up to 9 data bits
const DR_MASK: u32 = 0x1FF;

/// BRR mantissa and fraction
const BRR_MASK: u32 = 0xFFFF;

/// Emulated STM32 USART
#[derive(Debug, Clone)]
pub struct Stm32Usart {
    frequency: u32,
    rxne: bool,
    tc: bool,
    brr: u32,
    cr1: u32,
    cr2: u32,
    rx: Deque<u8, RX_FIFO_SIZE>,
    tx: Deque<u8, TX_QUEUE_SIZE>,
    irq: IrqLine,
}

impl Stm32Usart {
    /// Create a USART clocked at `frequency` Hz, in its reset state
    pub fn new(frequency: u32) -> Self {
        Self {
            frequency,
            rxne: false,
            tc: true,
            brr: 0,
            cr1: 0,
            cr2: 0,
            rx: Deque::new(),
            tx: Deque::new(),
            irq: IrqLine::new(),
        }
    }

    /// Peripheral clock (Hz)
    pub fn frequency(&self) -> u32 {
        self.frequency
    }

    /// Interrupt output
    pub fn irq(&self) -> &IrqLine {
        &self.irq
    }

    /// Bytes waiting in the receive FIFO
    pub fn rx_pending(&self) -> usize {
        self.rx.len()
    }

    /// Baud rate derived from BRR and CR1.OVER8
    ///
    /// `clock / (8 * (2 - OVER8) * (mantissa + fraction / 16))`, where
    /// oversampling by 8 ignores the top fraction bit. Zero when the divisor
    /// is zero.
    pub fn baud_rate(&self) -> u32 {
        let over8 = self.cr1 & cr1::OVER8 != 0;
        let mantissa = u64::from((self.brr >> 4) & 0xFFF);
        let fraction = u64::from(if over8 { self.brr & 0b111 } else { self.brr & 0xF });

        // Scaled by 16 to stay in integers
        let divisor = if over8 { 1 } else { 2 } * (mantissa * 16 + fraction);
        if divisor == 0 {
            return 0;
        }
        (u64::from(self.frequency) * 2 / divisor) as u32
    }

    /// Read a register
    ///
    /// Reading DR pops the receive FIFO.
    pub fn read(&mut self, offset: u32) -> u32 {
        match offset {
            reg::SR => self.status(),
            reg::DR => {
                let value = match self.rx.pop_front() {
                    Some(byte) => u32::from(byte),
                    None => {
                        warn!("usart: read from empty rx fifo");
                        0
                    }
                };
                self.rxne = !self.rx.is_empty();
                self.update_irq();
                value
            }
            reg::BRR => self.brr,
            reg::CR1 => self.cr1,
            reg::CR2 => self.cr2,
            _ => {
                warn!("usart: read from unimplemented offset {:#x}", offset);
                0
            }
        }
    }

    /// Write a register
    pub fn write(&mut self, offset: u32, value: u32) {
        match offset {
            reg::SR => {
                if value & sr::RXNE == 0 {
                    self.rxne = false;
                }
                if value & sr::TC == 0 {
                    self.tc = false;
                }
                self.update_irq();
            }
            reg::DR => self.transmit((value & DR_MASK) as u8),
            reg::BRR => {
                self.brr = value & BRR_MASK;
                debug!("usart: baud rate {}", self.baud_rate());
            }
            reg::CR1 => {
                self.cr1 = value & cr1::MASK;
                self.update_irq();
            }
            reg::CR2 => self.cr2 = value & cr2::MASK,
            _ => warn!(
                "usart: write {:#x} to unimplemented offset {:#x}",
                value,
                offset
            ),
        }
    }

    fn status(&self) -> u32 {
        let mut status = sr::TXE;
        if self.rxne {
            status |= sr::RXNE;
        }
        if self.tc {
            status |= sr::TC;
        }
        status
    }

    fn enabled(&self, bit: u32) -> bool {
        self.cr1 & (cr1::UE | bit) != 0
    }

    fn transmit(&mut self, byte: u8) {
        if !self.enabled(cr1::TE) {
            warn!("usart: transmitter disabled, dropping {:#x}", byte);
            return;
        }
        if self.tx.push_back(byte).is_err() {
            warn!("usart: tx queue full, dropping {:#x}", byte);
        }
        trace!("usart: tx {:#x}", byte);
        self.tc = true;
        self.update_irq();
    }

    fn update_irq(&mut self) {
        let raised = (self.cr1 & cr1::RXNEIE != 0 && self.rxne)
            || self.cr1 & cr1::TXEIE != 0
            || (self.cr1 & cr1::TCIE != 0 && self.tc);
        self.irq.set_state(raised);
    }
}

impl UartDevice for Stm32Usart {
    fn receive_byte(&mut self, byte: u8) {
        if !self.enabled(cr1::RE) {
            warn!("usart: receiver disabled, dropping {:#x}", byte);
            return;
        }
        if self.rx.push_back(byte).is_err() {
            warn!("usart: rx fifo full, dropping {:#x}", byte);
            return;
        }
        trace!("usart: rx {:#x}", byte);
        self.rxne = true;
        self.update_irq();
    }

    fn transmit_byte(&mut self) -> Option<u8> {
        self.tx.pop_front()
    }

    fn line_config(&self) -> UartConfig {
        let parity = match (self.cr1 & cr1::PCE != 0, self.cr1 & cr1::PS != 0) {
            (false, _) => Parity::None,
            (true, false) => Parity::Even,
            (true, true) => Parity::Odd,
        };
        let stop_bits = match (self.cr2 & cr2::STOP_MASK) >> cr2::STOP_SHIFT {
            0 => StopBits::One,
            1 => StopBits::Half,
            2 => StopBits::Two,
            _ => StopBits::OneAndHalf,
        };

        UartConfig {
            baudrate: self.baud_rate(),
            data_bits: if self.cr1 & cr1::M != 0 {
                DataBits::Nine
            } else {
                DataBits::Eight
            },
            parity,
            stop_bits,
        }
    }

    fn pending(&self) -> usize {
        self.tx.len()
    }
}

impl Resettable for Stm32Usart {
    fn reset(&mut self) {
        debug!("usart: reset");
        *self = Self {
            irq: self.irq,
            ..Self::new(self.frequency)
        };
        self.update_irq();
    }
}
