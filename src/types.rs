use uuid::Uuid;

/// One item as it appears in an offer or an inventory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemRef {
    pub market_name: String,
    pub tradable: bool,
}

impl ItemRef {
    pub fn tradable(market_name: &str) -> Self {
        Self { market_name: market_name.to_string(), tradable: true }
    }
}

/// An incoming trade offer, built by the platform collaborator per offer
/// event and consumed exactly once by the evaluator.
#[derive(Debug, Clone)]
pub struct TradeOffer {
    pub id: Uuid,
    pub partner_id: String,
    pub items_to_give: Vec<ItemRef>,
    pub items_to_receive: Vec<ItemRef>,
    pub message: String,
    pub is_glitched: bool,
}

/// A chat message as received, before normalization.
#[derive(Debug, Clone)]
pub struct ChatCommand {
    pub raw_text: String,
    pub sender_id: String,
}

/// Classification label attached to an accept/decline. Drives logging and
/// reply-template selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OfferReason {
    Glitched,
    Admin,
    Donation,
    Stealing,
    Sufficient,
    Insufficient,
}

impl OfferReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            OfferReason::Glitched => "glitched",
            OfferReason::Admin => "admin",
            OfferReason::Donation => "donation",
            OfferReason::Stealing => "stealing",
            OfferReason::Sufficient => "sufficient",
            OfferReason::Insufficient => "insufficient",
        }
    }
}

/// The sole output type of both engines. The adapter turns each variant
/// into collaborator actions; the engines themselves perform no I/O.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Send `text` back to the relevant identity.
    Reply(String),
    AcceptOffer(OfferReason),
    DeclineOffer(OfferReason),
    /// Fetch the sender's inventory and reply with its priced value.
    ValuateInventory,
    /// Authorized quit: stop the event loop and log off.
    Shutdown,
    NoAction,
}

/// Evaluator output: the decision plus any unknown-item warning replies the
/// caller must send alongside the accept/decline action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OfferVerdict {
    pub decision: Decision,
    pub warnings: Vec<String>,
}

impl OfferVerdict {
    pub fn new(decision: Decision) -> Self {
        Self { decision, warnings: vec![] }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationshipState {
    /// The other party sent us a friend request.
    IncomingRequest,
    Friend,
    Removed,
}

/// Events emitted by the platform collaborator.
#[derive(Debug, Clone)]
pub enum PlatformEvent {
    SessionEstablished,
    MessageReceived { sender_id: String, text: String },
    RelationshipChanged { sender_id: String, state: RelationshipState },
    OfferReceived(TradeOffer),
}
