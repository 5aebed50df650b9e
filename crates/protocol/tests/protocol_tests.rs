//! Integration tests for the probe wire formats
//!
//! Covers host command encoding, interrupt report decoding against
//! captured-style byte sequences, and the descriptor table constants.

use protocol::report::{BISR_ALARM, BISR_HDLC, BISR_LBCODE, BISR_SLIP, BISR_T1FRAME};
use protocol::{
    EndpointNumber, HostCommand, InterfaceNumber, POLL_COMMAND, ProtocolError, Report,
    SOC_OUT_BYTES_MAX, UsbError,
};
use proptest::prelude::*;

mod host_command {
    use super::*;

    #[test]
    fn test_poll_command_bytes() {
        assert_eq!(POLL_COMMAND.len(), 3);
        assert_eq!(POLL_COMMAND, [0x00, 0xFE, 0x01]);
    }

    #[test]
    fn test_decode_poll_command() {
        let cmd = HostCommand::decode(&POLL_COMMAND).expect("poll command decodes");
        assert_eq!(cmd, HostCommand::RegisterRead { address: 0x01fe });
    }

    #[test]
    fn test_ring_channel_write() {
        // Off-hook on channel 0 signalling register
        let cmd = HostCommand::RegisterWrite {
            address: 0x0340,
            value: 0x05,
        };
        assert_eq!(cmd.encode(), vec![0x01, 0x40, 0x03, 0x05]);
    }

    proptest! {
        #[test]
        fn prop_register_read_is_three_bytes(address in any::<u16>()) {
            let bytes = HostCommand::RegisterRead { address }.encode();
            prop_assert_eq!(bytes.len(), 3);
            prop_assert_eq!(bytes[0], 0x00);
            prop_assert_eq!(u16::from_le_bytes([bytes[1], bytes[2]]), address);
        }

        #[test]
        fn prop_register_write_decodes(address in any::<u16>(), value in any::<u8>()) {
            let cmd = HostCommand::RegisterWrite { address, value };
            prop_assert_eq!(HostCommand::decode(&cmd.encode()).unwrap(), cmd);
        }
    }
}

mod interrupt_report {
    use super::*;

    #[test]
    fn test_all_sections_in_order() {
        let mut data = vec![
            0x07,
            BISR_LBCODE | BISR_HDLC | BISR_SLIP | BISR_ALARM | BISR_T1FRAME,
        ];
        data.extend([1, 2, 3, 4, 5, 6, 7, 8]); // RLCISR0..7
        data.extend([0x00, 0x04, 0x00]); // DLSR0..2, no messages
        data.push(0x33); // SBISR
        data.extend([0xa1, 0xa2, 0xa3]); // AEISR EXZSR CIASR
        data.push(0x10); // FISR without SIG

        let report = Report::decode(&data).expect("decodes");
        assert_eq!(
            report.lines(),
            vec![
                "7 RLCISRx=[01 02 03 04 05 06 07 08]".to_string(),
                "7 DLSR1=04".to_string(),
                "7 SBISR=33".to_string(),
                "7 AEISR=a1 EXZSR=a2 CIASR=a3".to_string(),
                "7 FISR=10".to_string(),
            ]
        );
    }

    #[test]
    fn test_hdlc_count_masks_high_bit() {
        let data = [0x01, BISR_HDLC, 0x08, 0x81, 0x7e, 0x00, 0x00];
        let report = Report::decode(&data).expect("decodes");
        let hdlc = report.hdlc.expect("hdlc section");
        assert_eq!(hdlc[0].message.as_deref(), Some(&[0x7e][..]));
        assert!(hdlc[1].message.is_none());
    }

    #[test]
    fn test_truncated_alarm() {
        let data = [0x01, BISR_ALARM, 0xa1];
        match Report::decode(&data) {
            Err(ProtocolError::Truncated { field, offset }) => {
                assert_eq!(field, "EXZSR");
                assert_eq!(offset, 3);
            }
            other => panic!("expected truncation, got {:?}", other),
        }
    }

    proptest! {
        #[test]
        fn prop_decode_never_panics(data in proptest::collection::vec(any::<u8>(), 0..64)) {
            let _ = Report::decode(&data);
        }
    }
}

mod descriptor_table {
    use super::*;

    #[test]
    fn test_framer_control_numbers() {
        assert_eq!(u8::from(InterfaceNumber::FramerControl), 2);
        assert_eq!(u8::from(EndpointNumber::FramerControl), 3);
    }

    #[test]
    fn test_response_bound_holds_a_register_value() {
        assert!(SOC_OUT_BYTES_MAX >= 1);
    }

    #[test]
    fn test_only_no_device_is_disconnect() {
        for err in [UsbError::Timeout, UsbError::Pipe, UsbError::Io, UsbError::Busy] {
            assert!(!err.is_disconnect());
        }
        assert!(UsbError::NoDevice.is_disconnect());
    }
}
