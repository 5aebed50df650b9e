//! Owned USB descriptor model
//!
//! Backends translate the host stack's descriptors into these plain values
//! so that interface and endpoint selection can run against fabricated
//! descriptors in tests.

use std::fmt;

/// Endpoint address direction bit
pub const ENDPOINT_DIR_MASK: u8 = 0x80;
/// Endpoint number bits
pub const ENDPOINT_NUMBER_MASK: u8 = 0x0f;

/// Transfer direction, from the host's point of view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    In,
    Out,
}

impl Direction {
    /// Direction encoded in an endpoint address
    pub fn from_address(address: u8) -> Self {
        if address & ENDPOINT_DIR_MASK != 0 {
            Direction::In
        } else {
            Direction::Out
        }
    }

    /// Build an endpoint address for `number` in this direction
    pub fn to_endpoint_address(self, number: u8) -> u8 {
        match self {
            Direction::In => ENDPOINT_DIR_MASK | (number & ENDPOINT_NUMBER_MASK),
            Direction::Out => number & ENDPOINT_NUMBER_MASK,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::In => f.write_str("IN"),
            Direction::Out => f.write_str("OUT"),
        }
    }
}

/// Endpoint transfer type (bmAttributes bits 1..0)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransferKind {
    Control,
    Isochronous,
    Bulk,
    Interrupt,
}

impl TransferKind {
    pub fn from_attributes(attributes: u8) -> Self {
        match attributes & 0x03 {
            0 => TransferKind::Control,
            1 => TransferKind::Isochronous,
            2 => TransferKind::Bulk,
            _ => TransferKind::Interrupt,
        }
    }

    fn attributes(self) -> u8 {
        match self {
            TransferKind::Control => 0,
            TransferKind::Isochronous => 1,
            TransferKind::Bulk => 2,
            TransferKind::Interrupt => 3,
        }
    }
}

impl fmt::Display for TransferKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TransferKind::Control => "Control",
            TransferKind::Isochronous => "Isochronous",
            TransferKind::Bulk => "Bulk",
            TransferKind::Interrupt => "Interrupt",
        };
        f.write_str(name)
    }
}

/// Endpoint descriptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointInfo {
    /// bEndpointAddress (direction bit included)
    pub address: u8,
    pub kind: TransferKind,
    pub max_packet_size: u16,
    pub interval: u8,
}

impl EndpointInfo {
    pub fn new(direction: Direction, number: u8, kind: TransferKind, max_packet_size: u16) -> Self {
        Self {
            address: direction.to_endpoint_address(number),
            kind,
            max_packet_size,
            interval: 0,
        }
    }

    /// Endpoint number without the direction bit
    pub fn number(&self) -> u8 {
        self.address & ENDPOINT_NUMBER_MASK
    }

    pub fn direction(&self) -> Direction {
        Direction::from_address(self.address)
    }
}

/// One alternate setting of an interface
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceInfo {
    pub number: u8,
    pub alternate_setting: u8,
    pub class_code: u8,
    pub sub_class_code: u8,
    pub protocol_code: u8,
    pub endpoints: Vec<EndpointInfo>,
}

impl InterfaceInfo {
    /// First endpoint with the given direction and number
    pub fn find_endpoint(&self, direction: Direction, number: u8) -> Option<&EndpointInfo> {
        self.endpoints
            .iter()
            .find(|ep| ep.direction() == direction && ep.number() == number)
    }
}

/// Configuration descriptor with every interface alternate setting
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigurationInfo {
    pub number: u8,
    pub interfaces: Vec<InterfaceInfo>,
}

impl ConfigurationInfo {
    /// Look up an (interface, alternate setting) pair
    pub fn interface(&self, number: u8, alternate_setting: u8) -> Option<&InterfaceInfo> {
        self.interfaces
            .iter()
            .find(|i| i.number == number && i.alternate_setting == alternate_setting)
    }
}

fn class_name(class_code: u8) -> &'static str {
    match class_code {
        0x01 => "Audio",
        0x02 => "CDC Communication",
        0x03 => "Human Interface Device",
        0x08 => "Mass Storage",
        0x0a => "CDC Data",
        0xfe => "Application Specific",
        0xff => "Vendor Specific",
        _ => "",
    }
}

// Field layout follows the usual descriptor dump: name, hex value, annotation.
fn field(
    f: &mut fmt::Formatter<'_>,
    indent: &str,
    name: &str,
    value: u32,
    note: &str,
) -> fmt::Result {
    let hex = format!("{value:#x}");
    if note.is_empty() {
        writeln!(f, "{indent}{name:<19}: {hex:>6}")
    } else {
        writeln!(f, "{indent}{name:<19}: {hex:>6} {note}")
    }
}

impl fmt::Display for EndpointInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let title = format!(
            "ENDPOINT {:#x}: {} {}",
            self.address,
            self.kind,
            self.direction()
        );
        writeln!(f, "      {title:=<52}")?;
        field(f, "       ", "bLength", 7, "(7 bytes)")?;
        field(f, "       ", "bDescriptorType", 5, "Endpoint")?;
        field(
            f,
            "       ",
            "bEndpointAddress",
            self.address as u32,
            &self.direction().to_string(),
        )?;
        field(
            f,
            "       ",
            "bmAttributes",
            self.kind.attributes() as u32,
            &self.kind.to_string(),
        )?;
        field(
            f,
            "       ",
            "wMaxPacketSize",
            self.max_packet_size as u32,
            &format!("({} bytes)", self.max_packet_size),
        )?;
        field(f, "       ", "bInterval", self.interval as u32, "")
    }
}

impl fmt::Display for InterfaceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let title = format!(
            "INTERFACE {}: {}",
            self.number,
            class_name(self.class_code)
        );
        writeln!(f, "    {title:=<54}")?;
        field(f, "     ", "bLength", 9, "(9 bytes)")?;
        field(f, "     ", "bDescriptorType", 4, "Interface")?;
        field(f, "     ", "bInterfaceNumber", self.number as u32, "")?;
        field(f, "     ", "bAlternateSetting", self.alternate_setting as u32, "")?;
        field(f, "     ", "bNumEndpoints", self.endpoints.len() as u32, "")?;
        field(
            f,
            "     ",
            "bInterfaceClass",
            self.class_code as u32,
            class_name(self.class_code),
        )?;
        field(f, "     ", "bInterfaceSubClass", self.sub_class_code as u32, "")?;
        field(f, "     ", "bInterfaceProtocol", self.protocol_code as u32, "")?;
        for endpoint in &self.endpoints {
            write!(f, "{endpoint}")?;
        }
        Ok(())
    }
}
