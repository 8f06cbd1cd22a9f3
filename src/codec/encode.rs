//! Frame encoding: physical values back into payload bytes.
//!
//! `raw = round((physical - offset) / factor)`, clamped to the field width and written at the
//! signal's position with mask-and-or, so the bits of every other signal are preserved.

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::codec::frame::CanFrame;
use crate::codec::register::PayloadRegister;
use crate::dbc::types::{
    database::Network,
    errors::EncodeError,
    message::{Message, MuxRole},
    signal::{Signal, SignalKind},
};

/// Outcome of writing one signal.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EncodedValue {
    /// Raw field actually written; `i128` holds both signed and full-width unsigned fields.
    pub raw: i128,
    /// Physical value the written raw field decodes to.
    pub applied: f64,
    /// `true` when the requested value did not fit the field.
    pub clamped: bool,
}

/// A requested value that had to be clamped to fit its field.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClampReport {
    pub signal: String,
    pub requested: f64,
    pub applied: f64,
}

/// Raw field for `physical`, clamped to the field's range.
fn raw_for(signal: &Signal, physical: f64) -> Result<(i128, bool), EncodeError> {
    if !physical.is_finite() {
        return Err(EncodeError::NonFinite { value: physical });
    }
    let wanted: f64 = match signal.kind {
        // value tables are keyed by the raw code
        SignalKind::Enumerated => physical.round(),
        _ => {
            if signal.factor == 0.0 {
                return Err(EncodeError::ZeroFactor);
            }
            ((physical - signal.offset) / signal.factor).round()
        }
    };
    let (lo, hi) = signal.raw_bounds();
    // float to int casts saturate
    let unclamped: i128 = wanted as i128;
    let raw: i128 = unclamped.clamp(lo, hi);
    let clamped: bool = raw != unclamped;
    Ok((raw, clamped))
}

/// Encodes `physical` into `payload` at the position of `signal`.
///
/// At most the first 8 bytes of `payload` are touched. Out-of-range values are clamped to the
/// field width and flagged in the result rather than wrapped.
pub fn encode_signal(
    signal: &Signal,
    physical: f64,
    payload: &mut [u8],
) -> Result<EncodedValue, EncodeError> {
    let (raw, clamped) = raw_for(signal, physical)?;
    let mut reg: PayloadRegister = PayloadRegister::new(payload, 8);
    signal.insert_raw(&mut reg, raw as u64);
    payload[..reg.len()].copy_from_slice(reg.bytes());

    let applied: f64 = match signal.kind {
        SignalKind::Enumerated => raw as f64,
        _ => signal.to_physical(raw),
    };
    if clamped {
        debug!("value {physical} clamped to raw {raw} ({applied})");
    }
    Ok(EncodedValue {
        raw,
        applied,
        clamped,
    })
}

/// Encodes the enumeration entry `label` of `signal`.
pub fn encode_label(
    net: &Network,
    signal: &Signal,
    label: &str,
    payload: &mut [u8],
) -> Result<EncodedValue, EncodeError> {
    let code: i64 = signal
        .value_table
        .as_ref()
        .and_then(|t| t.code_of(label))
        .ok_or_else(|| EncodeError::UnknownLabel {
            signal: net.name(signal.name).to_string(),
            label: label.to_string(),
        })?;
    let mut reg: PayloadRegister = PayloadRegister::new(payload, 8);
    signal.insert_raw(&mut reg, code as u64);
    payload[..reg.len()].copy_from_slice(reg.bytes());
    Ok(EncodedValue {
        raw: code.into(),
        applied: code as f64,
        clamped: false,
    })
}

/// Builds a frame of `message` from `(signal name, physical value)` pairs.
///
/// Signals not listed stay zero. When multiplexed signals are given and the selector is not,
/// the selector is set to their switch value; signals of two different groups, or a group
/// that disagrees with an explicit selector value, are a [`EncodeError::MultiplexConflict`].
pub fn encode_message(
    net: &Network,
    message: &Message,
    values: &[(&str, f64)],
) -> Result<(CanFrame, Vec<ClampReport>), EncodeError> {
    let message_name: &str = net.name(message.name);
    let mut resolved: Vec<(&Signal, f64)> = Vec::with_capacity(values.len());
    for &(name, value) in values {
        let (_, signal) =
            net.signal_by_name(message, name)
                .ok_or_else(|| EncodeError::UnknownSignal {
                    message: message_name.to_string(),
                    signal: name.to_string(),
                })?;
        resolved.push((signal, value));
    }

    let len: usize = (message.byte_length as usize).min(8);
    let mut payload: [u8; 8] = [0; 8];
    let mut reports: Vec<ClampReport> = Vec::new();
    let mut record = |signal: &Signal, requested: f64, encoded: EncodedValue| {
        if encoded.clamped {
            let name: &str = net.name(signal.name);
            warn!(
                "{message_name}.{name}: {requested} clamped to {}",
                encoded.applied
            );
            reports.push(ClampReport {
                signal: name.to_string(),
                requested,
                applied: encoded.applied,
            });
        }
    };

    // selector first, so the groups can be checked against it
    let selector: Option<&Signal> = message.multiplexor.and_then(|k| net.signal(k));
    let mut selected: Option<u64> = None;
    if let Some(sel) = selector {
        for &(signal, value) in resolved.iter().filter(|(s, _)| std::ptr::eq(*s, sel)) {
            let encoded: EncodedValue = encode_signal(signal, value, &mut payload[..len])?;
            record(signal, value, encoded);
            selected = Some(encoded.raw as u64);
        }
    }
    let explicit: bool = selected.is_some();

    for &(signal, _) in &resolved {
        let MuxRole::Multiplexed(n) = signal.mux else {
            continue;
        };
        match selected {
            Some(current) if current != n as u64 => {
                return Err(EncodeError::MultiplexConflict {
                    signal: net.name(signal.name).to_string(),
                    wanted: n,
                    selected: current,
                });
            }
            _ => selected = Some(n as u64),
        }
    }
    if let (Some(sel), Some(n), false) = (selector, selected, explicit) {
        let mut reg: PayloadRegister = PayloadRegister::new(&payload[..len], message.byte_length);
        sel.insert_raw(&mut reg, n);
        payload[..reg.len()].copy_from_slice(reg.bytes());
    }

    for &(signal, value) in &resolved {
        if selector.is_some_and(|sel| std::ptr::eq(signal, sel)) {
            continue;
        }
        let encoded: EncodedValue = encode_signal(signal, value, &mut payload[..len])?;
        record(signal, value, encoded);
    }

    Ok((CanFrame::from_register(message.id, payload, len), reports))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::decode::decode_message;
    use crate::config::ParseOptions;
    use crate::dbc::parse::from_str;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    const NET: &str = concat!(
        "BO_ 100 EngineData: 8 Vector__XXX\n",
        " SG_ RPM : 0|16@1+ (0.25,0) [0|16383.75] \"rpm\" Vector__XXX\n",
        " SG_ Temp : 16|8@1- (1,-40) [-40|87] \"degC\" Vector__XXX\n",
        " SG_ Status : 24|2@1+ (1,0) [0|3] \"\" Vector__XXX\n",
        " SG_ Pressure : 39|12@0+ (0.5,0) [0|2047.5] \"kPa\" Vector__XXX\n",
        "VAL_ 100 Status 0 \"OK\" 1 \"Fault\" ;\n",
        "BO_ 2364540158 EEC1: 8 Vector__XXX\n",
        " SG_ Speed : 24|16@1+ (0.125,0) [0|8031.875] \"rpm\" Vector__XXX\n",
        "BO_ 200 Muxed: 4 Vector__XXX\n",
        " SG_ Page M : 0|8@1+ (1,0) [0|255] \"\" Vector__XXX\n",
        " SG_ A m0 : 8|16@1+ (1,0) [0|0] \"\" Vector__XXX\n",
        " SG_ B m1 : 8|16@1+ (2,0) [0|0] \"\" Vector__XXX\n",
    );

    #[test]
    fn encode_preserves_other_signals() {
        let net = from_str(NET, &ParseOptions::default());
        let m = net.message_by_id(100).unwrap();
        let (_, rpm) = net.signal_by_name(m, "RPM").unwrap();
        let mut payload = [0xFFu8; 8];
        let v = encode_signal(rpm, 2500.0, &mut payload).unwrap();
        assert_eq!(v.raw, 10000);
        assert!(!v.clamped);
        assert_eq!(payload, [0x10, 0x27, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF]);
    }

    #[test]
    fn out_of_range_values_clamp() {
        let net = from_str(NET, &ParseOptions::default());
        let m = net.message_by_id(100).unwrap();
        let (_, temp) = net.signal_by_name(m, "Temp").unwrap();
        let mut payload = [0u8; 8];
        let v = encode_signal(temp, -500.0, &mut payload).unwrap();
        assert!(v.clamped);
        assert_eq!(v.raw, -128);
        assert_relative_eq!(v.applied, -168.0);
        assert_eq!(payload[2], 0x80);

        assert!(matches!(
            encode_signal(temp, f64::NAN, &mut payload),
            Err(EncodeError::NonFinite { .. })
        ));
    }

    #[test]
    fn message_round_trip_within_quantization() {
        let net = from_str(NET, &ParseOptions::default());
        let m = net.message_by_id(100).unwrap();
        let wanted = [("RPM", 1234.6), ("Temp", 21.0), ("Status", 1.0), ("Pressure", 777.3)];
        let (frame, clamps) = encode_message(&net, m, &wanted).unwrap();
        assert!(clamps.is_empty());
        assert_eq!(frame.id(), 100);
        assert_eq!(frame.len(), 8);

        let decoded = decode_message(&net, m, frame.data());
        for (name, value) in wanted {
            let s = decoded.signal(name).unwrap();
            assert_abs_diff_eq!(s.as_f64(), value, epsilon = s.signal.factor / 2.0);
        }
        assert_eq!(decoded.signal("Status").unwrap().label(), Some("Fault"));
    }

    #[test]
    fn extended_message_keeps_flag() {
        let net = from_str(NET, &ParseOptions::default());
        let m = net.message_by_name("EEC1").unwrap();
        let (frame, _) = encode_message(&net, m, &[("Speed", 1500.0)]).unwrap();
        assert!(frame.is_extended());
        assert_eq!(frame.raw_id(), 0x0CF0_04FE);
        assert_eq!(&frame.data()[3..5], &[0xE0, 0x2E]);
    }

    #[test]
    fn mux_selector_follows_the_group() {
        let net = from_str(NET, &ParseOptions::default());
        let m = net.message_by_id(200).unwrap();
        let (frame, _) = encode_message(&net, m, &[("B", 10.0)]).unwrap();
        assert_eq!(frame.data(), &[1, 5, 0, 0]);

        let err = encode_message(&net, m, &[("A", 1.0), ("B", 2.0)]).unwrap_err();
        assert!(matches!(err, EncodeError::MultiplexConflict { wanted: 1, selected: 0, .. }));

        let err = encode_message(&net, m, &[("Page", 0.0), ("B", 2.0)]).unwrap_err();
        assert!(matches!(err, EncodeError::MultiplexConflict { wanted: 1, selected: 0, .. }));
    }

    #[test]
    fn unknown_signal_and_label() {
        let net = from_str(NET, &ParseOptions::default());
        let m = net.message_by_id(100).unwrap();
        assert!(matches!(
            encode_message(&net, m, &[("Nope", 1.0)]),
            Err(EncodeError::UnknownSignal { .. })
        ));
        let (_, status) = net.signal_by_name(m, "Status").unwrap();
        let mut payload = [0u8; 8];
        assert_eq!(encode_label(&net, status, "Fault", &mut payload).unwrap().raw, 1);
        assert_eq!(payload[3], 0x01);
        assert!(matches!(
            encode_label(&net, status, "Broken", &mut payload),
            Err(EncodeError::UnknownLabel { .. })
        ));
    }

    #[test]
    fn full_width_unsigned_field_round_trips() {
        let net = from_str(
            "BO_ 300 Wide: 8 Vector__XXX\n SG_ Big : 0|64@1+ (1,0) [0|0] \"\" Vector__XXX\n",
            &ParseOptions::default(),
        );
        let m = net.message_by_id(300).unwrap();
        let (_, big) = net.signal_by_name(m, "Big").unwrap();
        let mut payload = [0u8; 8];
        let v = encode_signal(big, 1e19, &mut payload).unwrap();
        assert!(!v.clamped);
        assert_eq!(v.raw, 10_000_000_000_000_000_000);
        assert_relative_eq!(v.applied, 1e19);

        let decoded = decode_message(&net, m, &payload);
        assert_eq!(decoded.signal("Big").unwrap().raw, v.raw);
        assert_relative_eq!(decoded.signal("Big").unwrap().as_f64(), 1e19);

        let v = encode_signal(big, 1e20, &mut payload).unwrap();
        assert!(v.clamped);
        assert_eq!(v.raw, u64::MAX as i128);
        assert_eq!(payload, [0xFF; 8]);
    }
}
