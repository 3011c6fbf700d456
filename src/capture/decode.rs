use std::net::{Ipv4Addr, Ipv6Addr};
use std::str;
use pnet::packet::{Packet as PacketExt, PacketSize};
use pnet::packet::ethernet::{EthernetPacket, EtherTypes};
use pnet::packet::ip::{IpNextHeaderProtocol, IpNextHeaderProtocols};
use pnet::packet::ipv4::Ipv4Packet;
use pnet::packet::ipv6::Ipv6Packet;
use pnet::packet::tcp::TcpPacket;
use pnet::packet::udp::UdpPacket;
use pnet::packet::vlan::VlanPacket;

pub const DNS_PORT: u16 = 53;

#[derive(Clone, Debug, Default)]
pub struct Event {
    pub network:   Option<Network>,
    pub transport: Option<Transport>,
    pub dns:       Option<String>,
}

#[derive(Copy, Clone, Debug)]
pub enum Network {
    V4 { src: Ipv4Addr, dst: Ipv4Addr },
    V6 { src: Ipv6Addr, dst: Ipv6Addr },
}

#[derive(Copy, Clone, Debug)]
pub enum Transport {
    Tcp { src: u16, dst: u16 },
    Udp { src: u16, dst: u16 },
}

pub fn decode(data: &[u8]) -> Option<Event> {
    let eth = EthernetPacket::new(data)?;

    let mut ethertype = eth.get_ethertype();
    let mut payload   = eth.payload();

    while ethertype == EtherTypes::Vlan {
        let pkt   = VlanPacket::new(payload)?;
        ethertype = pkt.get_ethertype();
        payload   = &payload[pkt.packet_size()..];
    }

    match ethertype {
        EtherTypes::Ipv4 => ipv4(payload),
        EtherTypes::Ipv6 => ipv6(payload),
        _                => Some(Event::default()),
    }
}

fn ipv4(payload: &[u8]) -> Option<Event> {
    let pkt = Ipv4Packet::new(payload)?;
    let (transport, dns) = transport(pkt.get_next_level_protocol(), pkt.payload());

    Some(Event {
        network:   Some(Network::V4 {
            src: pkt.get_source(),
            dst: pkt.get_destination(),
        }),
        transport: transport,
        dns:       dns,
    })
}

fn ipv6(payload: &[u8]) -> Option<Event> {
    let pkt = Ipv6Packet::new(payload)?;
    let (transport, dns) = transport(pkt.get_next_header(), pkt.payload());

    Some(Event {
        network:   Some(Network::V6 {
            src: pkt.get_source(),
            dst: pkt.get_destination(),
        }),
        transport: transport,
        dns:       dns,
    })
}

fn transport(protocol: IpNextHeaderProtocol, payload: &[u8]) -> (Option<Transport>, Option<String>) {
    match protocol {
        IpNextHeaderProtocols::Tcp => tcp(payload),
        IpNextHeaderProtocols::Udp => udp(payload),
        _                          => (None, None),
    }
}

fn tcp(payload: &[u8]) -> (Option<Transport>, Option<String>) {
    match TcpPacket::new(payload) {
        Some(pkt) => (Some(Transport::Tcp {
            src: pkt.get_source(),
            dst: pkt.get_destination(),
        }), None),
        None      => (None, None),
    }
}

fn udp(payload: &[u8]) -> (Option<Transport>, Option<String>) {
    let pkt = match UdpPacket::new(payload) {
        Some(pkt) => pkt,
        None      => return (None, None),
    };

    let src = pkt.get_source();
    let dst = pkt.get_destination();

    let dns = match src == DNS_PORT || dst == DNS_PORT {
        true  => qname(pkt.payload()),
        false => None,
    };

    (Some(Transport::Udp { src: src, dst: dst }), dns)
}

const DNS_HEADER: usize = 12;

pub fn qname(payload: &[u8]) -> Option<String> {
    let qdcount = u16::from_be_bytes([*payload.get(4)?, *payload.get(5)?]);
    if qdcount == 0 {
        return None;
    }

    let mut name = String::new();
    let mut at   = DNS_HEADER;

    loop {
        match *payload.get(at)? as usize {
            0                       => break,
            n if n & 0xc0 != 0      => return None, // no pointers in a question name
            n                       => {
                let label = payload.get(at + 1..at + 1 + n)?;
                if !name.is_empty() {
                    name.push('.');
                }
                name.push_str(str::from_utf8(label).ok()?);
                at += n + 1;
            }
        }
    }

    match name.is_empty() {
        true  => None,
        false => Some(name),
    }
}
