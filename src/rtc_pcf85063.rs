// PCF85063A/TP real-time clock over I2C: the watch's source of wall-clock time.
// Datasheet: https://files.waveshare.com/wiki/common/Pcf85063atl1118-NdPQpTGE-loeW7GbZ7.pdf

use embedded_hal::i2c::I2c;

use crate::time::WallTime;

pub const PCF85063_ADDR: u8 = 0x51;

// Seconds register; minutes, hours, days, weekdays, months, years follow
const REG_SECONDS: u8 = 0x04;

// Oscillator-stop flag in the seconds register
const OS_FLAG: u8 = 0x80;

// Century bit in the months register
const CENTURY_FLAG: u8 = 0x80;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct DateTime {
    pub year: u16,  // full year, e.g., 2024
    pub month: u8,  // 1-12
    pub day: u8,    // 1-31
    pub hour: u8,   // 0-23
    pub minute: u8, // 0-59
    pub second: u8, // 0-59
}

pub struct Pcf85063<I2C> {
    i2c: I2C,
}

impl<I2C, E> Pcf85063<I2C>
where
    I2C: I2c<Error = E>,
{
    pub fn new(i2c: I2C) -> Self {
        Self { i2c }
    }

    pub fn into_inner(self) -> I2C {
        self.i2c
    }

    /// Reads the clock. The flag is true when the oscillator stopped since
    /// the last set (power loss) and the time cannot be trusted.
    pub fn read_datetime(&mut self) -> Result<(DateTime, bool), E> {
        let mut regs = [0u8; 7];
        self.i2c.write_read(PCF85063_ADDR, &[REG_SECONDS], &mut regs)?;

        let stopped = regs[0] & OS_FLAG != 0;
        let century = if regs[5] & CENTURY_FLAG != 0 { 1900 } else { 2000 };
        let dt = DateTime {
            second: bcd_decode(regs[0] & 0x7F),
            minute: bcd_decode(regs[1] & 0x7F),
            hour: bcd_decode(regs[2] & 0x3F),
            day: bcd_decode(regs[3] & 0x3F),
            // regs[4] is the weekday, unused
            month: bcd_decode(regs[5] & 0x1F),
            year: century + bcd_decode(regs[6]) as u16,
        };
        Ok((dt, stopped))
    }

    /// Unix seconds if the clock is running and holds a plausible date.
    pub fn read_unix(&mut self) -> Result<Option<u32>, E> {
        let (dt, stopped) = self.read_datetime()?;
        if stopped || !datetime_is_valid(&dt) {
            tracing::warn!(stopped, year = dt.year, "rtc time not trusted");
            return Ok(None);
        }
        Ok(Some(datetime_to_unix(&dt)))
    }

    /// Writes all time registers; also clears the oscillator-stop flag.
    pub fn set_datetime(&mut self, dt: &DateTime) -> Result<(), E> {
        let frame = [
            REG_SECONDS,
            bcd_encode(dt.second),
            bcd_encode(dt.minute),
            bcd_encode(dt.hour),
            bcd_encode(dt.day),
            0,
            bcd_encode(dt.month),
            bcd_encode((dt.year % 100) as u8),
        ];
        self.i2c.write(PCF85063_ADDR, &frame)
    }
}

#[inline]
fn bcd_decode(v: u8) -> u8 {
    (v >> 4) * 10 + (v & 0x0F)
}

#[inline]
fn bcd_encode(v: u8) -> u8 {
    ((v / 10) << 4) | (v % 10)
}

// Days from 1970-01-01 to the given civil date (proleptic Gregorian).
fn days_from_civil(year: u16, month: u8, day: u8) -> i64 {
    let (m, d) = (month as i64, day as i64);
    let y = year as i64 - if m <= 2 { 1 } else { 0 };
    let era = y.div_euclid(400);
    let yoe = y - era * 400;
    let mp = (m + 9) % 12; // March = 0
    let doy = (153 * mp + 2) / 5 + d - 1;
    let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy;
    era * 146_097 + doe - 719_468
}

/// Seconds since the Unix epoch, saturating at the ends of `u32`.
pub fn datetime_to_unix(dt: &DateTime) -> u32 {
    let secs = days_from_civil(dt.year, dt.month, dt.day) * 86_400
        + dt.hour as i64 * 3_600
        + dt.minute as i64 * 60
        + dt.second as i64;
    secs.clamp(0, u32::MAX as i64) as u32
}

pub fn unix_to_datetime(ts: u32) -> DateTime {
    let days = (ts / 86_400) as i64;
    let tod = WallTime::from_unix(ts);

    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z - era * 146_097;
    let yoe = (doe - doe / 1_460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = doy - (153 * mp + 2) / 5 + 1;
    let month = if mp < 10 { mp + 3 } else { mp - 9 };
    let year = yoe + era * 400 + if month <= 2 { 1 } else { 0 };

    DateTime {
        year: year as u16,
        month: month as u8,
        day: day as u8,
        hour: tod.hour(),
        minute: tod.minute(),
        second: tod.second(),
    }
}

// Sanity check on decoded registers; the chip happily returns garbage after a brown-out.
pub fn datetime_is_valid(dt: &DateTime) -> bool {
    (2020..=2099).contains(&dt.year)
        && (1..=12).contains(&dt.month)
        && (1..=31).contains(&dt.day)
        && dt.hour < 24
        && dt.minute < 60
        && dt.second < 60
}
