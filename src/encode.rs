//! Frame writers for the order-lifecycle messages
//!
//! Each function appends one length-prefixed frame in the same layout the
//! decoder reads. Tracking number and timestamp are written as zero.

use bytes::BufMut;

use crate::message::MessageType;
use crate::orderbook::Side;

fn begin(out: &mut Vec<u8>, ty: MessageType, locate: u16) {
    let len = ty.body_len().unwrap_or(11);
    out.reserve(2 + len);
    out.put_u16(len as u16);
    out.put_u8(ty.tag());
    out.put_u16(locate);
    out.put_u16(0);
    out.put_uint(0, 6);
}

/// 'A'
pub fn add_order(
    out: &mut Vec<u8>,
    locate: u16,
    reference: u64,
    side: Side,
    shares: u32,
    stock: [u8; 8],
    price: u32,
) {
    begin(out, MessageType::AddOrder, locate);
    put_add_fields(out, reference, side, shares, stock, price);
}

/// 'F'
#[allow(clippy::too_many_arguments)]
pub fn add_order_mpid(
    out: &mut Vec<u8>,
    locate: u16,
    reference: u64,
    side: Side,
    shares: u32,
    stock: [u8; 8],
    price: u32,
    attribution: [u8; 4],
) {
    begin(out, MessageType::AddOrderMpid, locate);
    put_add_fields(out, reference, side, shares, stock, price);
    out.put_slice(&attribution);
}

fn put_add_fields(
    out: &mut Vec<u8>,
    reference: u64,
    side: Side,
    shares: u32,
    stock: [u8; 8],
    price: u32,
) {
    out.put_u64(reference);
    out.put_u8(side.indicator());
    out.put_u32(shares);
    out.put_slice(&stock);
    out.put_u32(price);
}

/// 'E'
pub fn execute_order(
    out: &mut Vec<u8>,
    locate: u16,
    reference: u64,
    executed: u32,
    match_number: u64,
) {
    begin(out, MessageType::ExecuteOrder, locate);
    out.put_u64(reference);
    out.put_u32(executed);
    out.put_u64(match_number);
}

/// 'C'
pub fn execute_order_with_price(
    out: &mut Vec<u8>,
    locate: u16,
    reference: u64,
    executed: u32,
    match_number: u64,
    printable: bool,
    price: u32,
) {
    begin(out, MessageType::ExecuteOrderWithPrice, locate);
    out.put_u64(reference);
    out.put_u32(executed);
    out.put_u64(match_number);
    out.put_u8(if printable { b'Y' } else { b'N' });
    out.put_u32(price);
}

/// 'X'
pub fn cancel_order(out: &mut Vec<u8>, locate: u16, reference: u64, canceled: u32) {
    begin(out, MessageType::CancelOrder, locate);
    out.put_u64(reference);
    out.put_u32(canceled);
}

/// 'D'
pub fn delete_order(out: &mut Vec<u8>, locate: u16, reference: u64) {
    begin(out, MessageType::DeleteOrder, locate);
    out.put_u64(reference);
}

/// 'U'
pub fn replace_order(
    out: &mut Vec<u8>,
    locate: u16,
    original: u64,
    replacement: u64,
    shares: u32,
    price: u32,
) {
    begin(out, MessageType::ReplaceOrder, locate);
    out.put_u64(original);
    out.put_u64(replacement);
    out.put_u32(shares);
    out.put_u32(price);
}

/// 'S', a 12-byte system event carrying `code`
pub fn system_event(out: &mut Vec<u8>, code: u8) {
    out.put_u16(12);
    out.put_u8(MessageType::SystemEvent.tag());
    out.put_u16(0);
    out.put_u16(0);
    out.put_uint(0, 6);
    out.put_u8(code);
}

/// Any body, framed as is
pub fn raw(out: &mut Vec<u8>, body: &[u8]) {
    out.put_u16(body.len() as u16);
    out.put_slice(body);
}
