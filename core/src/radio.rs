use serde::Serialize;

const BATTERY_FULL_VOLTS: f64 = 4.2;
const BATTERY_EMPTY_VOLTS: f64 = 3.0;
const RSSI_EXCELLENT_DBM: i32 = -50;
const RSSI_LOST_DBM: i32 = -120;

/// Link and power readings the network server attaches to an uplink.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct RadioMeta {
    /// dBm of the first receiving gateway
    pub rssi: Option<i32>,
    pub snr: Option<f64>,
    /// Hz
    pub frequency: Option<i64>,
    pub battery_voltage: Option<f64>,
}

impl RadioMeta {
    /// Charge in percent, linear between 3.0 V and 4.2 V of a Li-ion cell.
    pub fn battery_level(&self) -> Option<u8> {
        let volts = self.battery_voltage.filter(|v| v.is_finite())?;
        if volts >= BATTERY_FULL_VOLTS {
            Some(100)
        } else if volts <= BATTERY_EMPTY_VOLTS {
            Some(0)
        } else {
            let ratio = (volts - BATTERY_EMPTY_VOLTS) / (BATTERY_FULL_VOLTS - BATTERY_EMPTY_VOLTS);
            Some((ratio * 100.0) as u8)
        }
    }

    /// Link quality in percent, linear between -120 dBm and -50 dBm.
    pub fn signal_quality(&self) -> Option<u8> {
        let rssi = self.rssi?;
        if rssi >= RSSI_EXCELLENT_DBM {
            Some(100)
        } else if rssi <= RSSI_LOST_DBM {
            Some(0)
        } else {
            let ratio =
                f64::from(rssi - RSSI_LOST_DBM) / f64::from(RSSI_EXCELLENT_DBM - RSSI_LOST_DBM);
            Some((ratio * 100.0) as u8)
        }
    }
}
