use chrono::{Local, NaiveDateTime, SubsecRound};

/// Local wall-clock time at second precision, matching the wire format.
pub fn now() -> NaiveDateTime {
    Local::now().naive_local().trunc_subsecs(0)
}
