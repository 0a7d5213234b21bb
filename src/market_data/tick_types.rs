use std::fmt;

/// Market data tick types this crate distinguishes.
///
/// Anything else decodes as [TickType::Unknown]; the raw id is not needed downstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TickType {
    #[default]
    Unknown = -1,
    BidSize = 0,
    Bid = 1,
    Ask = 2,
    AskSize = 3,
    /// Price of the last trade.
    Last = 4,
    LastSize = 5,
    High = 6,
    Low = 7,
    Volume = 8,
    /// Previous day's closing price.
    Close = 9,
    BidOption = 10,
    AskOption = 11,
    LastOption = 12,
    /// Model-based option price and greeks.
    ModelOption = 13,
    Open = 14,
    OptionHistoricalVol = 23,
    OptionImpliedVol = 24,
    OptionCallOpenInterest = 27,
    OptionPutOpenInterest = 28,
    OptionCallVolume = 29,
    OptionPutVolume = 30,
    MarkPrice = 37,
    DelayedBid = 66,
    DelayedAsk = 67,
    DelayedLast = 68,
    DelayedBidSize = 69,
    DelayedAskSize = 70,
    DelayedLastSize = 71,
    DelayedHigh = 72,
    DelayedLow = 73,
    DelayedVolume = 74,
    DelayedClose = 75,
    DelayedOpen = 76,
    DelayedBidOption = 80,
    DelayedAskOption = 81,
    DelayedLastOption = 82,
    DelayedModelOption = 83,
}

impl TickType {
    /// Close price, live or delayed.
    pub fn is_close(&self) -> bool {
        matches!(self, TickType::Close | TickType::DelayedClose)
    }

    /// Last trade price, live or delayed.
    pub fn is_last(&self) -> bool {
        matches!(self, TickType::Last | TickType::DelayedLast)
    }

    /// Model option computation, live or delayed.
    pub fn is_model_option(&self) -> bool {
        matches!(self, TickType::ModelOption | TickType::DelayedModelOption)
    }

    /// Size tick paired with a price tick, if any.
    pub fn size_tick(&self) -> Option<TickType> {
        match self {
            TickType::Bid => Some(TickType::BidSize),
            TickType::Ask => Some(TickType::AskSize),
            TickType::Last => Some(TickType::LastSize),
            TickType::DelayedBid => Some(TickType::DelayedBidSize),
            TickType::DelayedAsk => Some(TickType::DelayedAskSize),
            TickType::DelayedLast => Some(TickType::DelayedLastSize),
            _ => None,
        }
    }
}

impl From<i32> for TickType {
    fn from(value: i32) -> Self {
        match value {
            0 => Self::BidSize,
            1 => Self::Bid,
            2 => Self::Ask,
            3 => Self::AskSize,
            4 => Self::Last,
            5 => Self::LastSize,
            6 => Self::High,
            7 => Self::Low,
            8 => Self::Volume,
            9 => Self::Close,
            10 => Self::BidOption,
            11 => Self::AskOption,
            12 => Self::LastOption,
            13 => Self::ModelOption,
            14 => Self::Open,
            23 => Self::OptionHistoricalVol,
            24 => Self::OptionImpliedVol,
            27 => Self::OptionCallOpenInterest,
            28 => Self::OptionPutOpenInterest,
            29 => Self::OptionCallVolume,
            30 => Self::OptionPutVolume,
            37 => Self::MarkPrice,
            66 => Self::DelayedBid,
            67 => Self::DelayedAsk,
            68 => Self::DelayedLast,
            69 => Self::DelayedBidSize,
            70 => Self::DelayedAskSize,
            71 => Self::DelayedLastSize,
            72 => Self::DelayedHigh,
            73 => Self::DelayedLow,
            74 => Self::DelayedVolume,
            75 => Self::DelayedClose,
            76 => Self::DelayedOpen,
            80 => Self::DelayedBidOption,
            81 => Self::DelayedAskOption,
            82 => Self::DelayedLastOption,
            83 => Self::DelayedModelOption,
            _ => Self::Unknown,
        }
    }
}

impl fmt::Display for TickType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({})", self, *self as i32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_i32() {
        assert_eq!(TickType::from(4), TickType::Last);
        assert_eq!(TickType::from(9), TickType::Close);
        assert_eq!(TickType::from(13), TickType::ModelOption);
        assert_eq!(TickType::from(83), TickType::DelayedModelOption);
        assert_eq!(TickType::from(221), TickType::Unknown);
    }

    #[test]
    fn test_live_and_delayed_groups() {
        assert!(TickType::Close.is_close());
        assert!(TickType::DelayedClose.is_close());
        assert!(!TickType::Last.is_close());

        assert!(TickType::DelayedLast.is_last());
        assert!(TickType::DelayedModelOption.is_model_option());
        assert!(!TickType::BidOption.is_model_option());
    }

    #[test]
    fn test_size_tick() {
        assert_eq!(TickType::Last.size_tick(), Some(TickType::LastSize));
        assert_eq!(TickType::Close.size_tick(), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(TickType::ModelOption.to_string(), "ModelOption(13)");
    }
}
