//! Turns a PVS snapshot into the fixed set of `pvs_*` measurements.
//!
//! Building never fails: a value that is missing or does not parse simply
//! leaves its field out, and a record that ends up with no fields is dropped.

use crate::line::record::{FieldValue, Record};
use crate::pvs::{DeviceDescriptor, DeviceKind, Snapshot};

const ACTIVE_INTERFACE: &str = "/sys/info/active_interface";
const SSID: &str = "/sys/info/ssid";
// The link tag always reflects the Wi-Fi station, whichever interface is active.
const LINK_STATE: &str = "/net/sta0/state";
const BROADBAND_CONNECTED: &str = "/sys/toggle_cell/broadband_connected";
const CELL_CONNECTED: &str = "/sys/toggle_cell/cell_connected";
const MODEL: &str = "/sys/info/model";
const SERIAL: &str = "/sys/info/serialnum";
const FIRMWARE_REV: &str = "/sys/info/fwrev";
const SOFTWARE_REV: &str = "/sys/info/sw_rev";

const GRID_PROFILE_ID: &str = "0bbe89271171935e527489a181960fd15a3e9b5c";
const GRID_PROFILE_NAME: &str = "IEEE-1547-2018 CA Rule21 v01.0";

/// Where a field's value comes from.
#[derive(Debug, Clone, Copy)]
enum Source {
    /// Numeric snapshot variable
    Var(&'static str),
    /// Fixed value written every cycle
    Const(i64),
}

const INVERTER_FIELDS: &[(&str, &str)] = &[
    ("freq_hz", "freqHz"),
    ("i_3phsum_a", "i3phsumA"),
    ("i_mppt1_a", "iMppt1A"),
    ("ltea_3phsum_kwh", "ltea3phsumKwh"),
    ("p_3phsum_kw", "p3phsumKw"),
    ("p_mppt1_kw", "pMppt1Kw"),
    ("t_htsnk_degc", "tHtsnkDegc"),
    ("v_mppt1_v", "vMppt1V"),
    ("vln_3phavg_v", "vln3phavgV"),
];

const METER_FIELDS: &[(&str, &str)] = &[
    ("ct_scl_fctr", "ctSclFctr"),
    ("freq_hz", "freqHz"),
    ("i1_a", "i1A"),
    ("i2_a", "i2A"),
    ("neg_ltea_3phsum_kwh", "negLtea3phsumKwh"),
    ("net_ltea_3phsum_kwh", "netLtea3phsumKwh"),
    ("p_3phsum_kw", "p3phsumKw"),
    ("pos_ltea_3phsum_kwh", "posLtea3phsumKwh"),
    ("q_3phsum_kvar", "q3phsumKvar"),
    ("s_3phsum_kva", "s3phsumKva"),
    ("tot_pf_rto", "totPfRto"),
    ("v12_v", "v12V"),
    ("v1n_v", "v1nV"),
    ("v2n_v", "v2nV"),
];

const SESSION_START_FIELDS: &[(&str, Source)] = &[
    ("build", Source::Var("/sys/info/build")),
    ("easicver", Source::Var("/sys/info/easicver")),
    ("ok", Source::Const(1)),
    ("scbuild", Source::Var("/sys/info/scbuild")),
    ("scver", Source::Var("/sys/info/scver")),
    ("wnmodel", Source::Var("/sys/info/wnmodel")),
    ("wnserial", Source::Var("/sys/info/wnserial")),
    ("wnver", Source::Var("/sys/info/wnver")),
];

const SUPERVISOR_FIELDS: &[(&str, Source)] = &[
    ("dl_comm_err", Source::Var("/sys/info/dl_comm_err")),
    ("dl_cpu_load", Source::Var("/sys/info/cpu_usage")),
    ("dl_err_count", Source::Var("/sys/info/dl_err_count")),
    ("dl_flash_avail", Source::Var("/sys/info/flash_usage")),
    ("dl_mem_used", Source::Var("/sys/info/ram_usage")),
    ("dl_scan_time", Source::Const(10)),
    ("dl_skipped_scans", Source::Const(0)),
    ("dl_untransmitted", Source::Const(0)),
    ("dl_uptime", Source::Var("/sys/info/uptime")),
];

impl DeviceKind {
    /// Measurement carrying this kind's telemetry.
    pub fn measurement(self) -> &'static str {
        match self {
            DeviceKind::Meter => "pvs_power_meter",
            DeviceKind::Inverter => "pvs_inverter",
        }
    }

    /// `(field name, variable leaf)` pairs for this kind's telemetry.
    pub fn telemetry_fields(self) -> &'static [(&'static str, &'static str)] {
        match self {
            DeviceKind::Meter => METER_FIELDS,
            DeviceKind::Inverter => INVERTER_FIELDS,
        }
    }
}

/// Build every record for one snapshot.
///
/// Order: comm interface, comm system, device states (meters then inverters),
/// grid profile, inverter telemetry, meter telemetry, session start, supervisor.
pub fn build(snapshot: &Snapshot, timestamp: i64) -> Vec<Record> {
    let devices = snapshot.devices();
    let of_kind = |kind: DeviceKind| devices.iter().filter(move |d| d.kind == kind);

    let mut records = vec![
        comm_interface(snapshot, timestamp),
        comm_system(snapshot, timestamp),
    ];
    records.extend(of_kind(DeviceKind::Meter).map(|d| device_state(d, timestamp)));
    records.extend(of_kind(DeviceKind::Inverter).map(|d| device_state(d, timestamp)));
    records.push(grid_profile(timestamp));
    records.extend(of_kind(DeviceKind::Inverter).map(|d| device_telemetry(snapshot, d, timestamp)));
    records.extend(of_kind(DeviceKind::Meter).map(|d| device_telemetry(snapshot, d, timestamp)));
    records.push(session_start(snapshot, timestamp));
    records.push(supervisor(snapshot, timestamp));

    records.retain(Record::has_fields);
    records
}

fn comm_interface(snapshot: &Snapshot, timestamp: i64) -> Record {
    let link = if snapshot.is(LINK_STATE, "online") {
        "connected"
    } else {
        "disconnected"
    };

    Record::new("pvs_comm_interface", timestamp)
        .with_tag("interface", snapshot.get_or_empty(ACTIVE_INTERFACE))
        .with_tag("link", link)
        .with_tag("mode", "wan")
        .with_tag("ssid", snapshot.get_or_empty(SSID))
        .with_field("internet", Some(FieldValue::flag(snapshot.is(BROADBAND_CONNECTED, "1"))))
        .with_field("sms", Some(FieldValue::Integer(0)))
}

fn comm_system(snapshot: &Snapshot, timestamp: i64) -> Record {
    let interface = snapshot.get_or_empty(ACTIVE_INTERFACE);

    Record::new("pvs_comm_system", timestamp)
        .with_tag("interface", interface)
        .with_tag("interface_name", interface)
        .with_field("internet", Some(FieldValue::flag(snapshot.is(BROADBAND_CONNECTED, "1"))))
        .with_field("sms", Some(FieldValue::flag(snapshot.is(CELL_CONNECTED, "1"))))
}

fn device_tags(record: Record, device: &DeviceDescriptor) -> Record {
    record
        .with_tag("device_type", device.kind.device_type())
        .with_tag("model", &device.model)
        .with_tag("serial", &device.serial)
}

fn device_state(device: &DeviceDescriptor, timestamp: i64) -> Record {
    device_tags(Record::new("pvs_device_state", timestamp), device)
        .with_field("state", Some(FieldValue::Integer(1)))
}

fn device_telemetry(snapshot: &Snapshot, device: &DeviceDescriptor, timestamp: i64) -> Record {
    let mut record = device_tags(Record::new(device.kind.measurement(), timestamp), device);
    if device.kind == DeviceKind::Meter {
        record = record.with_tag("mode", device.meter_mode().as_str());
    }

    record.with_fields(
        device
            .kind
            .telemetry_fields()
            .iter()
            .map(|(name, leaf)| (*name, FieldValue::number(device.var(snapshot, leaf)))),
    )
}

fn grid_profile(timestamp: i64) -> Record {
    Record::new("pvs_grid_profile", timestamp)
        .with_tag("active_id", GRID_PROFILE_ID)
        .with_tag("active_name", GRID_PROFILE_NAME)
        .with_tag("pending_id", GRID_PROFILE_ID)
        .with_tag("pending_name", GRID_PROFILE_NAME)
        .with_tag("status", "success")
        .with_tag("supported_by", "ALL")
        .with_field("percent", Some(FieldValue::Integer(100)))
}

fn resolve<'a>(
    snapshot: &'a Snapshot,
    table: &'static [(&'static str, Source)],
) -> impl Iterator<Item = (&'static str, Option<FieldValue>)> + 'a {
    table.iter().map(move |(name, source)| {
        let value = match source {
            Source::Var(path) => FieldValue::number(snapshot.get(path)),
            Source::Const(value) => Some(FieldValue::Integer(*value)),
        };
        (*name, value)
    })
}

fn session_start(snapshot: &Snapshot, timestamp: i64) -> Record {
    let fwver = snapshot
        .get_or_empty(FIRMWARE_REV)
        .split(',')
        .next()
        .unwrap_or_default();

    Record::new("pvs_session_start", timestamp)
        .with_tag("model", snapshot.get_or_empty(MODEL))
        .with_tag("serial", snapshot.get_or_empty(SERIAL))
        .with_tag("fwver", fwver)
        .with_tag("swver", snapshot.get_or_empty(SOFTWARE_REV))
        .with_fields(resolve(snapshot, SESSION_START_FIELDS))
}

fn supervisor(snapshot: &Snapshot, timestamp: i64) -> Record {
    let model = format!("PV Supervisor {}", snapshot.get_or_empty(MODEL));

    Record::new("pvs_supervisor", timestamp)
        .with_tag("device_type", "PVS")
        .with_tag("model", &model)
        .with_tag("serial", snapshot.get_or_empty(SERIAL))
        .with_fields(resolve(snapshot, SUPERVISOR_FIELDS))
}
