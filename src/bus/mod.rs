//! Models of everything outside the bridge core: the host FIFO endpoints, the
//! serial peripheral and a recorder for the serial bus.

pub mod device;
pub mod fifo;
pub mod trace;

pub use device::{DeviceDrive, NullDevice, SerialDevice, ShiftDevice};
pub use fifo::{FLOATING_BUS, InputQueue, OutputQueue};
pub use trace::BusTrace;
