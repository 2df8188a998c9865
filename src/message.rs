//! ITCH message types and field decoding
//!
//! Offsets are relative to the start of the message body, so offset 0 is the
//! type tag. All integers are unsigned big-endian; values are not range checked.

use bytes::Buf;

use crate::error::BookError;
use crate::orderbook::Side;

/// Every message type tag the protocol defines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageType {
    SystemEvent,
    StockDirectory,
    TradingAction,
    RegShoRestriction,
    MpidPosition,
    MwcbDecline,
    MwcbStatus,
    IpoQuoteUpdate,
    AddOrder,
    AddOrderMpid,
    ExecuteOrder,
    ExecuteOrderWithPrice,
    CancelOrder,
    DeleteOrder,
    ReplaceOrder,
    Trade,
    CrossTrade,
    BrokenTrade,
    NetOrderImbalance,
    RetailPriceImprovement,
    LuldAuctionCollar,
}

impl MessageType {
    pub const ALL: [MessageType; 21] = [
        MessageType::SystemEvent,
        MessageType::StockDirectory,
        MessageType::TradingAction,
        MessageType::RegShoRestriction,
        MessageType::MpidPosition,
        MessageType::MwcbDecline,
        MessageType::MwcbStatus,
        MessageType::IpoQuoteUpdate,
        MessageType::AddOrder,
        MessageType::AddOrderMpid,
        MessageType::ExecuteOrder,
        MessageType::ExecuteOrderWithPrice,
        MessageType::CancelOrder,
        MessageType::DeleteOrder,
        MessageType::ReplaceOrder,
        MessageType::Trade,
        MessageType::CrossTrade,
        MessageType::BrokenTrade,
        MessageType::NetOrderImbalance,
        MessageType::RetailPriceImprovement,
        MessageType::LuldAuctionCollar,
    ];

    /// Look up a type by its wire tag
    pub fn from_tag(tag: u8) -> Option<Self> {
        let ty = match tag {
            b'S' => MessageType::SystemEvent,
            b'R' => MessageType::StockDirectory,
            b'H' => MessageType::TradingAction,
            b'Y' => MessageType::RegShoRestriction,
            b'L' => MessageType::MpidPosition,
            b'V' => MessageType::MwcbDecline,
            b'W' => MessageType::MwcbStatus,
            b'K' => MessageType::IpoQuoteUpdate,
            b'A' => MessageType::AddOrder,
            b'F' => MessageType::AddOrderMpid,
            b'E' => MessageType::ExecuteOrder,
            b'C' => MessageType::ExecuteOrderWithPrice,
            b'X' => MessageType::CancelOrder,
            b'D' => MessageType::DeleteOrder,
            b'U' => MessageType::ReplaceOrder,
            b'P' => MessageType::Trade,
            b'Q' => MessageType::CrossTrade,
            b'B' => MessageType::BrokenTrade,
            b'I' => MessageType::NetOrderImbalance,
            b'N' => MessageType::RetailPriceImprovement,
            b'J' => MessageType::LuldAuctionCollar,
            _ => return None,
        };
        Some(ty)
    }

    pub fn tag(self) -> u8 {
        match self {
            MessageType::SystemEvent => b'S',
            MessageType::StockDirectory => b'R',
            MessageType::TradingAction => b'H',
            MessageType::RegShoRestriction => b'Y',
            MessageType::MpidPosition => b'L',
            MessageType::MwcbDecline => b'V',
            MessageType::MwcbStatus => b'W',
            MessageType::IpoQuoteUpdate => b'K',
            MessageType::AddOrder => b'A',
            MessageType::AddOrderMpid => b'F',
            MessageType::ExecuteOrder => b'E',
            MessageType::ExecuteOrderWithPrice => b'C',
            MessageType::CancelOrder => b'X',
            MessageType::DeleteOrder => b'D',
            MessageType::ReplaceOrder => b'U',
            MessageType::Trade => b'P',
            MessageType::CrossTrade => b'Q',
            MessageType::BrokenTrade => b'B',
            MessageType::NetOrderImbalance => b'I',
            MessageType::RetailPriceImprovement => b'N',
            MessageType::LuldAuctionCollar => b'J',
        }
    }

    /// Metric label
    pub fn name(self) -> &'static str {
        match self {
            MessageType::SystemEvent => "system_event",
            MessageType::StockDirectory => "stock_directory",
            MessageType::TradingAction => "trading_action",
            MessageType::RegShoRestriction => "reg_sho_restriction",
            MessageType::MpidPosition => "mpid_position",
            MessageType::MwcbDecline => "mwcb_decline",
            MessageType::MwcbStatus => "mwcb_status",
            MessageType::IpoQuoteUpdate => "ipo_quote_update",
            MessageType::AddOrder => "add_order",
            MessageType::AddOrderMpid => "add_order_mpid",
            MessageType::ExecuteOrder => "execute_order",
            MessageType::ExecuteOrderWithPrice => "execute_order_with_price",
            MessageType::CancelOrder => "cancel_order",
            MessageType::DeleteOrder => "delete_order",
            MessageType::ReplaceOrder => "replace_order",
            MessageType::Trade => "trade",
            MessageType::CrossTrade => "cross_trade",
            MessageType::BrokenTrade => "broken_trade",
            MessageType::NetOrderImbalance => "net_order_imbalance",
            MessageType::RetailPriceImprovement => "retail_price_improvement",
            MessageType::LuldAuctionCollar => "luld_auction_collar",
        }
    }

    /// Whether the engine interprets this type
    pub fn is_order_event(self) -> bool {
        self.body_len().is_some()
    }

    /// Canonical body length (tag included) of the order-lifecycle types
    pub fn body_len(self) -> Option<usize> {
        match self {
            MessageType::AddOrder => Some(36),
            MessageType::AddOrderMpid => Some(40),
            MessageType::ExecuteOrder => Some(31),
            MessageType::ExecuteOrderWithPrice => Some(36),
            MessageType::CancelOrder => Some(23),
            MessageType::DeleteOrder => Some(19),
            MessageType::ReplaceOrder => Some(35),
            _ => None,
        }
    }
}

/// Fields shared by every message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Header {
    pub locate: u16,
    pub tracking: u16,
    /// Nanoseconds since midnight (48-bit on the wire)
    pub timestamp: u64,
}

/// 'A' / 'F'
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddOrder {
    pub header: Header,
    pub reference: u64,
    pub side: Side,
    pub shares: u32,
    /// Right-padded ASCII symbol
    pub stock: [u8; 8],
    pub price: u32,
    /// Market participant, present on 'F' only
    pub attribution: Option<[u8; 4]>,
}

/// 'E' / 'C'
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecuteOrder {
    pub header: Header,
    pub reference: u64,
    pub executed: u32,
    pub match_number: u64,
    /// `(printable, execution price)`, present on 'C' only
    pub with_price: Option<(bool, u32)>,
}

/// 'X'
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CancelOrder {
    pub header: Header,
    pub reference: u64,
    pub canceled: u32,
}

/// 'D'
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeleteOrder {
    pub header: Header,
    pub reference: u64,
}

/// 'U'
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplaceOrder {
    pub header: Header,
    pub original_reference: u64,
    pub new_reference: u64,
    pub shares: u32,
    pub price: u32,
}

/// A decoded order-lifecycle message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderEvent {
    Add(AddOrder),
    Execute(ExecuteOrder),
    Cancel(CancelOrder),
    Delete(DeleteOrder),
    Replace(ReplaceOrder),
}

impl OrderEvent {
    /// Decode a message body.
    ///
    /// Returns `Ok(None)` for every type the engine does not interpret,
    /// recognized or not.
    pub fn decode(body: &[u8]) -> Result<Option<Self>, BookError> {
        let Some(&tag) = body.first() else {
            return Ok(None);
        };
        let Some(ty) = MessageType::from_tag(tag) else {
            return Ok(None);
        };
        let Some(needed) = ty.body_len() else {
            return Ok(None);
        };
        if body.len() < needed {
            return Err(BookError::MessageTooShort {
                tag: tag as char,
                len: body.len(),
                needed,
            });
        }

        let header = read_header(body);
        let event = match ty {
            MessageType::AddOrder | MessageType::AddOrderMpid => OrderEvent::Add(AddOrder {
                header,
                reference: u64_at(body, 11),
                side: Side::from_indicator(body[19]),
                shares: u32_at(body, 20),
                stock: bytes_at(body, 24),
                price: u32_at(body, 32),
                attribution: (ty == MessageType::AddOrderMpid).then(|| bytes_at(body, 36)),
            }),
            MessageType::ExecuteOrder | MessageType::ExecuteOrderWithPrice => {
                OrderEvent::Execute(ExecuteOrder {
                    header,
                    reference: u64_at(body, 11),
                    executed: u32_at(body, 19),
                    match_number: u64_at(body, 23),
                    with_price: (ty == MessageType::ExecuteOrderWithPrice)
                        .then(|| (body[31] == b'Y', u32_at(body, 32))),
                })
            }
            MessageType::CancelOrder => OrderEvent::Cancel(CancelOrder {
                header,
                reference: u64_at(body, 11),
                canceled: u32_at(body, 19),
            }),
            MessageType::DeleteOrder => OrderEvent::Delete(DeleteOrder {
                header,
                reference: u64_at(body, 11),
            }),
            MessageType::ReplaceOrder => OrderEvent::Replace(ReplaceOrder {
                header,
                original_reference: u64_at(body, 11),
                new_reference: u64_at(body, 19),
                shares: u32_at(body, 27),
                price: u32_at(body, 31),
            }),
            _ => return Ok(None),
        };
        Ok(Some(event))
    }

    pub fn header(&self) -> &Header {
        match self {
            OrderEvent::Add(m) => &m.header,
            OrderEvent::Execute(m) => &m.header,
            OrderEvent::Cancel(m) => &m.header,
            OrderEvent::Delete(m) => &m.header,
            OrderEvent::Replace(m) => &m.header,
        }
    }
}

fn read_header(body: &[u8]) -> Header {
    Header {
        locate: u16_at(body, 1),
        tracking: u16_at(body, 3),
        timestamp: u48_at(body, 5),
    }
}

#[inline]
pub fn u16_at(body: &[u8], offset: usize) -> u16 {
    (&body[offset..]).get_u16()
}

#[inline]
pub fn u32_at(body: &[u8], offset: usize) -> u32 {
    (&body[offset..]).get_u32()
}

#[inline]
pub fn u64_at(body: &[u8], offset: usize) -> u64 {
    (&body[offset..]).get_u64()
}

#[inline]
pub fn u48_at(body: &[u8], offset: usize) -> u64 {
    (&body[offset..]).get_uint(6)
}

#[inline]
fn bytes_at<const N: usize>(body: &[u8], offset: usize) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(&body[offset..offset + N]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode;

    #[test]
    fn test_tags_round_trip() {
        for ty in MessageType::ALL {
            assert_eq!(MessageType::from_tag(ty.tag()), Some(ty));
        }
        assert_eq!(MessageType::from_tag(b'Z'), None);
    }

    #[test]
    fn test_decode_add_order_fields() {
        let mut frame = Vec::new();
        encode::add_order(&mut frame, 5, 42, Side::Buy, 100, *b"AAPL    ", 1_500_000);
        let body = &frame[2..];

        let Some(OrderEvent::Add(add)) = OrderEvent::decode(body).unwrap() else {
            panic!("Expected add order");
        };
        assert_eq!(add.header.locate, 5);
        assert_eq!(add.reference, 42);
        assert_eq!(add.side, Side::Buy);
        assert_eq!(add.shares, 100);
        assert_eq!(&add.stock, b"AAPL    ");
        assert_eq!(add.price, 1_500_000);
        assert_eq!(add.attribution, None);
    }

    #[test]
    fn test_decode_fixed_offsets_by_hand() {
        // Replace: original 7 -> new 8, 20 shares at 990
        let mut body = vec![0u8; 35];
        body[0] = b'U';
        body[11..19].copy_from_slice(&7u64.to_be_bytes());
        body[19..27].copy_from_slice(&8u64.to_be_bytes());
        body[27..31].copy_from_slice(&20u32.to_be_bytes());
        body[31..35].copy_from_slice(&990u32.to_be_bytes());

        let event = OrderEvent::decode(&body).unwrap();
        let Some(OrderEvent::Replace(replace)) = event else {
            panic!("Expected replace");
        };
        assert_eq!(replace.original_reference, 7);
        assert_eq!(replace.new_reference, 8);
        assert_eq!(replace.shares, 20);
        assert_eq!(replace.price, 990);
    }

    #[test]
    fn test_side_indicator() {
        let mut body = vec![0u8; 36];
        body[0] = b'A';
        body[19] = b'S';
        let Some(OrderEvent::Add(add)) = OrderEvent::decode(&body).unwrap() else {
            panic!("Expected add order");
        };
        assert_eq!(add.side, Side::Sell);

        // Anything but 'B' is a sell
        body[19] = b'?';
        let Some(OrderEvent::Add(add)) = OrderEvent::decode(&body).unwrap() else {
            panic!("Expected add order");
        };
        assert_eq!(add.side, Side::Sell);
    }

    #[test]
    fn test_execute_with_price() {
        let mut frame = Vec::new();
        encode::execute_order_with_price(&mut frame, 3, 11, 25, 9001, true, 123_400);
        let Some(OrderEvent::Execute(exec)) = OrderEvent::decode(&frame[2..]).unwrap() else {
            panic!("Expected execute");
        };
        assert_eq!(exec.reference, 11);
        assert_eq!(exec.executed, 25);
        assert_eq!(exec.match_number, 9001);
        assert_eq!(exec.with_price, Some((true, 123_400)));
    }

    #[test]
    fn test_uninterpreted_types_decode_to_none() {
        let body = [b'S', 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, b'O'];
        assert_eq!(OrderEvent::decode(&body).unwrap(), None);
        assert_eq!(OrderEvent::decode(&[b'Z', 1, 2]).unwrap(), None);
        assert_eq!(OrderEvent::decode(&[]).unwrap(), None);
    }

    #[test]
    fn test_short_body_is_rejected() {
        let body = [b'D', 0, 1, 0, 0];
        let err = OrderEvent::decode(&body).unwrap_err();
        assert_eq!(
            err,
            BookError::MessageTooShort {
                tag: 'D',
                len: 5,
                needed: 19
            }
        );
    }

    #[test]
    fn test_timestamp_is_48_bit() {
        let mut body = vec![0u8; 19];
        body[0] = b'D';
        body[5..11].copy_from_slice(&[0x00, 0x00, 0x01, 0x02, 0x03, 0x04]);
        let event = OrderEvent::decode(&body).unwrap().unwrap();
        assert_eq!(event.header().timestamp, 0x0102_0304);
    }
}
