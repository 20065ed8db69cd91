//! The GDB Remote Serial Protocol register payload codec.
//!
//! Everything in here works on packet _bodies_. Packet framing, checksums,
//! acknowledgments and command dispatch are the responsibility of the
//! surrounding stub.

mod codec;
mod common;
mod response_writer;

pub use codec::{
    collect_register_as_string, encode_registers, parse_regno, registers_from_string,
    registers_to_string, supply_register_from_hex, write_expedited,
};
pub use response_writer::ResponseWriter;
