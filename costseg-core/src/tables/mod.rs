//! Static rate tables: the bonus schedule and the MACRS recovery tables.

pub mod bonus;
pub mod macrs;

pub use bonus::{BonusRange, BonusSchedule, BonusScheduleError};
pub use macrs::{half_year_rate, mid_month_rate, recovery_rate};
