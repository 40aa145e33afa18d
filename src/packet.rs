//! BDD encoding of IPv4 packet headers.
//!
//! Every header field gets a contiguous block of BDD variables, most
//! significant bit first, so that prefixes and ranges produce small diagrams.
//! The [`PacketBdd`] handle owns the BDD manager and is passed explicitly to
//! whoever needs to build or inspect header spaces.

use std::fmt::{Display, Formatter};
use std::net::Ipv4Addr;

use num_bigint::BigUint;

use crate::bdd::Bdd;
use crate::config::BddConfig;
use crate::error::{ReachError, Result};
use crate::header_space::HeaderSpace;
use crate::reference::Ref;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum PacketField {
    DstIp,
    SrcIp,
    DstPort,
    SrcPort,
    IpProtocol,
    IcmpType,
    IcmpCode,
    TcpFlags,
}

impl PacketField {
    /// All fields, in variable order.
    pub const ALL: [PacketField; 8] = [
        PacketField::DstIp,
        PacketField::SrcIp,
        PacketField::DstPort,
        PacketField::SrcPort,
        PacketField::IpProtocol,
        PacketField::IcmpType,
        PacketField::IcmpCode,
        PacketField::TcpFlags,
    ];

    /// Width in bits.
    pub const fn width(self) -> u32 {
        match self {
            PacketField::DstIp | PacketField::SrcIp => 32,
            PacketField::DstPort | PacketField::SrcPort => 16,
            PacketField::IpProtocol
            | PacketField::IcmpType
            | PacketField::IcmpCode
            | PacketField::TcpFlags => 8,
        }
    }

    /// First BDD variable of this field (variables are 1-indexed).
    fn first_var(self) -> u32 {
        1 + PacketField::ALL
            .iter()
            .take_while(|&&f| f != self)
            .map(|f| f.width())
            .sum::<u32>()
    }

    /// BDD variable of bit `bit` of this field, counting from the most significant bit.
    pub fn var(self, bit: u32) -> u32 {
        assert!(bit < self.width(), "Bit {} out of range for {}", bit, self);
        self.first_var() + bit
    }

    pub fn vars(self) -> impl Iterator<Item = u32> {
        let first = self.first_var();
        first..first + self.width()
    }

    fn check_value(self, value: u64) -> Result<()> {
        if value >> self.width() != 0 {
            return Err(ReachError::FieldValueOutOfRange {
                field: self,
                width: self.width(),
                value,
            });
        }
        Ok(())
    }
}

impl Display for PacketField {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PacketField::DstIp => "dstIp",
            PacketField::SrcIp => "srcIp",
            PacketField::DstPort => "dstPort",
            PacketField::SrcPort => "srcPort",
            PacketField::IpProtocol => "ipProtocol",
            PacketField::IcmpType => "icmpType",
            PacketField::IcmpCode => "icmpCode",
            PacketField::TcpFlags => "tcpFlags",
        };
        write!(f, "{}", name)
    }
}

/// Total number of header variables.
pub const NUM_HEADER_VARS: usize = 128;

/// One concrete header valuation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Packet {
    pub dst_ip: Ipv4Addr,
    pub src_ip: Ipv4Addr,
    pub dst_port: u16,
    pub src_port: u16,
    pub ip_protocol: u8,
    pub icmp_type: u8,
    pub icmp_code: u8,
    pub tcp_flags: u8,
}

impl Packet {
    pub fn get(&self, field: PacketField) -> u64 {
        match field {
            PacketField::DstIp => u32::from(self.dst_ip) as u64,
            PacketField::SrcIp => u32::from(self.src_ip) as u64,
            PacketField::DstPort => self.dst_port as u64,
            PacketField::SrcPort => self.src_port as u64,
            PacketField::IpProtocol => self.ip_protocol as u64,
            PacketField::IcmpType => self.icmp_type as u64,
            PacketField::IcmpCode => self.icmp_code as u64,
            PacketField::TcpFlags => self.tcp_flags as u64,
        }
    }

    fn set(&mut self, field: PacketField, value: u64) {
        match field {
            PacketField::DstIp => self.dst_ip = Ipv4Addr::from(value as u32),
            PacketField::SrcIp => self.src_ip = Ipv4Addr::from(value as u32),
            PacketField::DstPort => self.dst_port = value as u16,
            PacketField::SrcPort => self.src_port = value as u16,
            PacketField::IpProtocol => self.ip_protocol = value as u8,
            PacketField::IcmpType => self.icmp_type = value as u8,
            PacketField::IcmpCode => self.icmp_code = value as u8,
            PacketField::TcpFlags => self.tcp_flags = value as u8,
        }
    }
}

impl Default for Packet {
    fn default() -> Self {
        Self {
            dst_ip: Ipv4Addr::UNSPECIFIED,
            src_ip: Ipv4Addr::UNSPECIFIED,
            dst_port: 0,
            src_port: 0,
            ip_protocol: 0,
            icmp_type: 0,
            icmp_code: 0,
            tcp_flags: 0,
        }
    }
}

impl Display for Packet {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{} -> {}:{} proto={}",
            self.src_ip, self.src_port, self.dst_ip, self.dst_port, self.ip_protocol
        )
    }
}

/// Header-space domain backed by a [`Bdd`] manager.
///
/// ```
/// use bdd_reach::header_space::HeaderSpace;
/// use bdd_reach::packet::{PacketBdd, PacketField};
///
/// let packets = PacketBdd::new();
/// let web = packets.value(PacketField::DstPort, 80).unwrap();
/// let tcp = packets.value(PacketField::IpProtocol, 6).unwrap();
/// let tcp_web = packets.intersect(&web, &tcp);
/// assert!(packets.is_subset(&tcp_web, &web));
/// assert!(!packets.is_empty(&tcp_web));
/// ```
#[derive(Debug, Default)]
pub struct PacketBdd {
    bdd: Bdd,
}

impl PacketBdd {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: BddConfig) -> Self {
        Self {
            bdd: Bdd::with_config(config),
        }
    }

    /// The underlying manager.
    pub fn bdd(&self) -> &Bdd {
        &self.bdd
    }

    // Literals fixing the `len` most significant bits of `field` to those of `value`.
    fn literals(field: PacketField, value: u64, len: u32) -> impl Iterator<Item = i32> {
        let width = field.width();
        (0..len).map(move |bit| {
            let var = field.var(bit) as i32;
            if (value >> (width - 1 - bit)) & 1 == 1 {
                var
            } else {
                -var
            }
        })
    }

    /// Headers whose `field` equals `value`.
    pub fn value(&self, field: PacketField, value: u64) -> Result<Ref> {
        field.check_value(value)?;
        Ok(self.bdd.cube(Self::literals(field, value, field.width())))
    }

    /// Headers whose `field` starts with the `len` most significant bits of `value`.
    pub fn prefix(&self, field: PacketField, value: u64, len: u8) -> Result<Ref> {
        field.check_value(value)?;
        if len as u32 > field.width() {
            return Err(ReachError::InvalidPrefixLength(len));
        }
        Ok(self.bdd.cube(Self::literals(field, value, len as u32)))
    }

    pub fn dst_prefix(&self, ip: Ipv4Addr, len: u8) -> Result<Ref> {
        self.prefix(PacketField::DstIp, u32::from(ip) as u64, len)
    }

    pub fn src_prefix(&self, ip: Ipv4Addr, len: u8) -> Result<Ref> {
        self.prefix(PacketField::SrcIp, u32::from(ip) as u64, len)
    }

    /// Headers whose `field` lies in `lo..=hi`. An inverted range is empty.
    pub fn range(&self, field: PacketField, lo: u64, hi: u64) -> Result<Ref> {
        field.check_value(lo)?;
        field.check_value(hi)?;
        if lo > hi {
            return Ok(self.bdd.zero());
        }
        let ge = self.compare(field, lo, true);
        let le = self.compare(field, hi, false);
        Ok(self.bdd.apply_and(ge, le))
    }

    // Builds `field >= bound` (or `field <= bound`) from the least significant bit up:
    // `res` holds the comparison restricted to the bits below the current one.
    fn compare(&self, field: PacketField, bound: u64, greater: bool) -> Ref {
        let width = field.width();
        let mut res = self.bdd.one();
        for bit in (0..width).rev() {
            let x = self.bdd.mk_var(field.var(bit));
            let b = (bound >> (width - 1 - bit)) & 1 == 1;
            res = match (greater, b) {
                (true, false) => self.bdd.apply_or(x, res),
                (true, true) => self.bdd.apply_and(x, res),
                (false, true) => self.bdd.apply_or(-x, res),
                (false, false) => self.bdd.apply_and(-x, res),
            };
        }
        res
    }

    /// Number of headers in `set`.
    pub fn count(&self, set: Ref) -> BigUint {
        self.bdd.sat_count(set, NUM_HEADER_VARS)
    }

    /// Pick one packet from `set`, or `None` if it is empty.
    ///
    /// Unconstrained bits are zero.
    pub fn representative(&self, set: Ref) -> Option<Packet> {
        let literals = self.bdd.one_sat(set)?;
        let mut packet = Packet::default();
        for lit in literals.into_iter().filter(|&lit| lit > 0) {
            let var = lit as u32;
            let field = PacketField::ALL
                .into_iter()
                .find(|f| f.vars().any(|v| v == var))?;
            let bit = var - field.first_var();
            let value = packet.get(field) | (1u64 << (field.width() - 1 - bit));
            packet.set(field, value);
        }
        Some(packet)
    }

    /// The singleton set containing exactly `packet`.
    pub fn packet(&self, packet: &Packet) -> Ref {
        let literals = PacketField::ALL
            .into_iter()
            .flat_map(|field| Self::literals(field, packet.get(field), field.width()));
        self.bdd.cube(literals)
    }
}

impl HeaderSpace for PacketBdd {
    type Set = Ref;
    type Field = PacketField;

    fn empty(&self) -> Ref {
        self.bdd.zero()
    }

    fn full(&self) -> Ref {
        self.bdd.one()
    }

    fn union(&self, a: &Ref, b: &Ref) -> Ref {
        self.bdd.apply_or(*a, *b)
    }

    fn intersect(&self, a: &Ref, b: &Ref) -> Ref {
        self.bdd.apply_and(*a, *b)
    }

    fn complement(&self, a: &Ref) -> Ref {
        self.bdd.apply_not(*a)
    }

    fn is_empty(&self, a: &Ref) -> bool {
        self.bdd.is_zero(*a)
    }

    fn forget(&self, a: &Ref, field: PacketField) -> Ref {
        self.bdd.exists(*a, field.vars())
    }

    fn difference(&self, a: &Ref, b: &Ref) -> Ref {
        self.bdd.apply_diff(*a, *b)
    }

    fn is_full(&self, a: &Ref) -> bool {
        self.bdd.is_one(*a)
    }
}
