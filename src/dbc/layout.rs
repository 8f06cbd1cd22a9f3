//! Model validation run once the whole file has been parsed.
//!
//! Problems are reported as diagnostics and the signals stay in the model: decoding still
//! reads whatever bits of the payload are addressable.

use crate::dbc::types::{
    database::Network,
    diagnostics::DiagnosticKind,
    message::MuxRole,
    signal::{Signal, low_mask},
};

/// Checks every message for signals outside its payload and for overlapping signals.
pub fn validate(net: &mut Network) {
    let mut found: Vec<DiagnosticKind> = Vec::new();

    for (_, message) in net.messages() {
        let message_name: &str = net.name(message.name);
        let total_bits: u32 = message.payload_bits();
        let payload_mask: u64 = low_mask(total_bits);
        let signals: Vec<&Signal> = net.signals_of(message).map(|(_, s)| s).collect();

        for s in &signals {
            if !fits(s, payload_mask) {
                found.push(DiagnosticKind::SignalOutOfRange {
                    message: message_name.to_string(),
                    signal: net.name(s.name).to_string(),
                    total_bits,
                });
            }
        }

        for (i, a) in signals.iter().enumerate() {
            for b in &signals[i + 1..] {
                let shared: u64 = a.layout().occupied_bits() & b.layout().occupied_bits();
                if shared != 0 && can_coexist(a.mux, b.mux) {
                    found.push(DiagnosticKind::OverlappingSignals {
                        message: message_name.to_string(),
                        first: net.name(a.name).to_string(),
                        second: net.name(b.name).to_string(),
                    });
                }
            }
        }
    }

    for kind in found {
        net.report(None, kind);
    }
}

/// `true` when every declared bit of the field lies inside the payload.
pub(crate) fn fits(signal: &Signal, payload_mask: u64) -> bool {
    let layout = signal.layout();
    let addressable: bool = layout.pad == 0 && u16::from(layout.width) == signal.bit_length;
    addressable && layout.occupied_bits() & !payload_mask == 0
}

/// Whether two signals can be present in the same frame.
pub(crate) fn can_coexist(a: MuxRole, b: MuxRole) -> bool {
    match (a, b) {
        (MuxRole::Multiplexed(x), MuxRole::Multiplexed(y)) => x == y,
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use crate::config::ParseOptions;
    use crate::dbc::parse::from_str;
    use crate::dbc::types::diagnostics::DiagnosticKind;

    fn kinds(text: &str) -> Vec<DiagnosticKind> {
        from_str(text, &ParseOptions::default())
            .diagnostics()
            .iter()
            .map(|d| d.kind.clone())
            .collect()
    }

    #[test]
    fn identical_unconditional_ranges_overlap() {
        let k = kinds(concat!(
            "BO_ 100 M: 8 Vector__XXX\n",
            " SG_ A : 0|8@1+ (1,0) [0|255] \"\" Vector__XXX\n",
            " SG_ B : 0|8@1+ (1,0) [0|255] \"\" Vector__XXX\n",
        ));
        assert_eq!(k.len(), 1);
        assert!(matches!(&k[0], DiagnosticKind::OverlappingSignals { first, second, .. }
            if first == "A" && second == "B"));
    }

    #[test]
    fn distinct_mux_groups_may_share_bits() {
        let k = kinds(concat!(
            "BO_ 100 M: 8 Vector__XXX\n",
            " SG_ Sel M : 0|8@1+ (1,0) [0|255] \"\" Vector__XXX\n",
            " SG_ A m0 : 8|16@1+ (1,0) [0|0] \"\" Vector__XXX\n",
            " SG_ B m1 : 8|16@1+ (1,0) [0|0] \"\" Vector__XXX\n",
        ));
        assert!(k.is_empty(), "{k:?}");
    }

    #[test]
    fn same_mux_group_overlap_is_flagged() {
        let k = kinds(concat!(
            "BO_ 100 M: 8 Vector__XXX\n",
            " SG_ Sel M : 0|8@1+ (1,0) [0|255] \"\" Vector__XXX\n",
            " SG_ A m1 : 8|16@1+ (1,0) [0|0] \"\" Vector__XXX\n",
            " SG_ B m1 : 16|8@1+ (1,0) [0|0] \"\" Vector__XXX\n",
        ));
        assert_eq!(k.len(), 1);
    }

    #[test]
    fn field_past_byte_length_is_out_of_range() {
        let k = kinds(concat!(
            "BO_ 100 M: 2 Vector__XXX\n",
            " SG_ Ok : 0|16@1+ (1,0) [0|0] \"\" Vector__XXX\n",
            "BO_ 101 N: 2 Vector__XXX\n",
            " SG_ Long : 8|16@1+ (1,0) [0|0] \"\" Vector__XXX\n",
            " SG_ Moto : 23|8@0+ (1,0) [0|0] \"\" Vector__XXX\n",
        ));
        let names: Vec<&str> = k
            .iter()
            .filter_map(|d| match d {
                DiagnosticKind::SignalOutOfRange { signal, .. } => Some(signal.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(names, vec!["Long", "Moto"]);
    }

    #[test]
    fn motorola_field_past_last_byte_is_out_of_range() {
        // start bit 58, 8 bits runs out of the register
        let k = kinds(concat!(
            "BO_ 100 M: 8 Vector__XXX\n",
            " SG_ Tail : 58|8@0+ (1,0) [0|0] \"\" Vector__XXX\n",
        ));
        assert!(matches!(k[0], DiagnosticKind::SignalOutOfRange { total_bits: 64, .. }));
    }
}
