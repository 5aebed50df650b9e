//! Framer interrupt reports
//!
//! The gateware forwards framer interrupts on the interrupt IN endpoint.
//! Each report starts with the channel number and the block interrupt
//! status register (BISR); BISR bits select which sections follow, in a
//! fixed order.

use crate::error::{ProtocolError, Result};
use bytes::Buf;

/// BISR bit: line code interrupt (RLCISR block follows)
pub const BISR_LBCODE: u8 = 0x40;
/// BISR bit: HDLC controller interrupt
pub const BISR_HDLC: u8 = 0x08;
/// BISR bit: slip buffer interrupt
pub const BISR_SLIP: u8 = 0x04;
/// BISR bit: alarm and error interrupt
pub const BISR_ALARM: u8 = 0x02;
/// BISR bit: T1 framer interrupt
pub const BISR_T1FRAME: u8 = 0x01;

/// DLSR bit: end of received HDLC message
pub const DLSR_RX_EOT: u8 = 0x08;
/// FISR bit: signalling change (RSAR block follows)
pub const FISR_SIG: u8 = 0x20;

const RLCISR_COUNT: usize = 8;
const HDLC_CONTROLLERS: usize = 3;
const RSAR_COUNT: usize = 12;

/// One HDLC controller's status within a report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HdlcStatus {
    pub dlsr: u8,
    /// Received message when RxEOT was set
    pub message: Option<Vec<u8>>,
}

/// T1 framer section
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct T1Frame {
    pub fisr: u8,
    /// Receive signalling array, present when FISR.SIG is set
    pub rsar: Option<Vec<u8>>,
}

/// Decoded interrupt report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub channel: u8,
    pub bisr: u8,
    pub rlcisr: Option<Vec<u8>>,
    pub hdlc: Option<[HdlcStatus; HDLC_CONTROLLERS]>,
    pub sbisr: Option<u8>,
    /// (AEISR, EXZSR, CIASR)
    pub alarm: Option<(u8, u8, u8)>,
    pub t1frame: Option<T1Frame>,
}

struct Reader<'a> {
    buf: &'a [u8],
    len: usize,
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self {
            buf,
            len: buf.len(),
        }
    }

    fn offset(&self) -> usize {
        self.len - self.buf.remaining()
    }

    fn u8(&mut self, field: &'static str) -> Result<u8> {
        if !self.buf.has_remaining() {
            return Err(ProtocolError::Truncated {
                field,
                offset: self.offset(),
            });
        }
        Ok(self.buf.get_u8())
    }

    fn take(&mut self, n: usize, field: &'static str) -> Result<Vec<u8>> {
        if self.buf.remaining() < n {
            return Err(ProtocolError::Truncated {
                field,
                offset: self.offset(),
            });
        }
        let mut out = vec![0u8; n];
        self.buf.copy_to_slice(&mut out);
        Ok(out)
    }
}

impl Report {
    /// Decode a report read from the interrupt endpoint
    ///
    /// Trailing bytes after the last selected section are ignored.
    pub fn decode(data: &[u8]) -> Result<Self> {
        let mut r = Reader::new(data);
        let channel = r.u8("channel")?;
        let bisr = r.u8("BISR")?;

        let rlcisr = if bisr & BISR_LBCODE != 0 {
            Some(r.take(RLCISR_COUNT, "RLCISR")?)
        } else {
            None
        };

        let hdlc = if bisr & BISR_HDLC != 0 {
            let mut read_one = || -> Result<HdlcStatus> {
                let dlsr = r.u8("DLSR")?;
                let message = if dlsr & DLSR_RX_EOT != 0 {
                    let count = (r.u8("RDLBCR")? & 0x7f) as usize;
                    Some(r.take(count, "LAPDBCR")?)
                } else {
                    None
                };
                Ok(HdlcStatus { dlsr, message })
            };
            Some([read_one()?, read_one()?, read_one()?])
        } else {
            None
        };

        let sbisr = if bisr & BISR_SLIP != 0 {
            Some(r.u8("SBISR")?)
        } else {
            None
        };

        let alarm = if bisr & BISR_ALARM != 0 {
            Some((r.u8("AEISR")?, r.u8("EXZSR")?, r.u8("CIASR")?))
        } else {
            None
        };

        let t1frame = if bisr & BISR_T1FRAME != 0 {
            let fisr = r.u8("FISR")?;
            let rsar = if fisr & FISR_SIG != 0 {
                Some(r.take(RSAR_COUNT, "RSAR")?)
            } else {
                None
            };
            Some(T1Frame { fisr, rsar })
        } else {
            None
        };

        Ok(Self {
            channel,
            bisr,
            rlcisr,
            hdlc,
            sbisr,
            alarm,
            t1frame,
        })
    }

    /// Human-readable lines, one per reported event
    ///
    /// HDLC controllers with a zero status and no message produce no line.
    pub fn lines(&self) -> Vec<String> {
        let ch = self.channel;
        let mut lines = Vec::new();

        if let Some(rlcisr) = &self.rlcisr {
            lines.push(format!("{ch} RLCISRx=[{}]", format_bytes_hex(rlcisr)));
        }

        if let Some(hdlc) = &self.hdlc {
            for (i, status) in hdlc.iter().enumerate() {
                match &status.message {
                    Some(message) => lines.push(format!(
                        "{ch} DLSR{i}={:02x} HDLC{i}=[{}]",
                        status.dlsr,
                        format_bytes_hex(message)
                    )),
                    None if status.dlsr != 0 => {
                        lines.push(format!("{ch} DLSR{i}={:02x}", status.dlsr))
                    }
                    None => {}
                }
            }
        }

        if let Some(sbisr) = self.sbisr {
            lines.push(format!("{ch} SBISR={sbisr:02x}"));
        }

        if let Some((aeisr, exzsr, ciasr)) = self.alarm {
            lines.push(format!(
                "{ch} AEISR={aeisr:02x} EXZSR={exzsr:02x} CIASR={ciasr:02x}"
            ));
        }

        if let Some(frame) = &self.t1frame {
            match &frame.rsar {
                Some(rsar) => lines.push(format!(
                    "{ch} FISR={:02x} RASR=[{}]",
                    frame.fisr,
                    format_bytes_hex(rsar)
                )),
                None => lines.push(format!("{ch} FISR={:02x}", frame.fisr)),
            }
        }

        lines
    }
}

/// Space-separated lowercase hex
pub fn format_bytes_hex(data: &[u8]) -> String {
    data.iter()
        .map(|b| format!("{b:02x}"))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_bytes_hex() {
        assert_eq!(format_bytes_hex(&[0x00, 0xab, 0x1f]), "00 ab 1f");
        assert_eq!(format_bytes_hex(&[]), "");
    }

    #[test]
    fn test_header_only() {
        let report = Report::decode(&[0x05, 0x00]).unwrap();
        assert_eq!(report.channel, 5);
        assert!(report.lines().is_empty());
    }

    #[test]
    fn test_missing_header() {
        assert!(matches!(
            Report::decode(&[0x01]),
            Err(ProtocolError::Truncated {
                field: "BISR",
                offset: 1
            })
        ));
    }

    #[test]
    fn test_hdlc_message() {
        // DLSR0 = RxEOT with 2-byte message, DLSR1 = 0x01, DLSR2 = 0
        let data = [0x02, BISR_HDLC, 0x08, 0x82, 0xaa, 0xbb, 0x01, 0x00];
        let report = Report::decode(&data).unwrap();
        assert_eq!(
            report.lines(),
            vec!["2 DLSR0=08 HDLC0=[aa bb]".to_string(), "2 DLSR1=01".to_string()]
        );
    }

    #[test]
    fn test_t1frame_with_signalling() {
        let mut data = vec![0x00, BISR_T1FRAME, FISR_SIG];
        data.extend(0..12u8);
        let report = Report::decode(&data).unwrap();
        let frame = report.t1frame.as_ref().unwrap();
        assert_eq!(frame.rsar.as_ref().unwrap().len(), 12);
        assert_eq!(
            report.lines(),
            vec!["0 FISR=20 RASR=[00 01 02 03 04 05 06 07 08 09 0a 0b]".to_string()]
        );
    }

    #[test]
    fn test_truncated_rsar() {
        let data = [0x00, BISR_T1FRAME, FISR_SIG, 0x01, 0x02];
        assert!(matches!(
            Report::decode(&data),
            Err(ProtocolError::Truncated { field: "RSAR", .. })
        ));
    }
}
