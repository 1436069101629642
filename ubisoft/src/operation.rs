use strum_macros::Display;

/// GraphQL operations sent to the gateway, displayed as their `operationName`.
#[derive(Display, Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Operation {
    GetItemDetails,
    GetBalance,
    CreateBuyOrder,
    CancelOrder,
}

impl Operation {
    pub(crate) fn query(self) -> String {
        match self {
            Operation::GetItemDetails => GET_ITEM_DETAILS.to_string(),
            Operation::GetBalance => GET_BALANCE.to_string(),
            Operation::CreateBuyOrder => format!("{CREATE_BUY_ORDER}{TRADE_FRAGMENT}"),
            Operation::CancelOrder => format!("{CANCEL_ORDER}{TRADE_FRAGMENT}"),
        }
    }

    /// Whether any `expired` mention in the errors means the session ticket ran out.
    pub(crate) fn reports_session_expiry(self) -> bool {
        matches!(self, Operation::GetItemDetails | Operation::GetBalance)
    }
}

const GET_ITEM_DETAILS: &str = r#"
query GetItemDetails($spaceId: String!, $itemId: String!) {
    game(spaceId: $spaceId) {
        marketableItem(itemId: $itemId) {
            item {
                name
                type
                viewer {
                    meta {
                        isOwned
                    }
                }
            }
            marketData {
                sellStats {
                    paymentItemId
                    lowestPrice
                    highestPrice
                }
            }
        }
    }
}
"#;

const GET_BALANCE: &str = r#"
query GetBalance($spaceId: String!, $itemId: String!) {
    game(spaceId: $spaceId) {
        viewer {
            meta {
                secondaryStoreItem(itemId: $itemId) {
                    meta {
                        quantity
                    }
                }
            }
        }
    }
}
"#;

const CREATE_BUY_ORDER: &str = r#"
mutation CreateBuyOrder($spaceId: String!, $tradeItems: [TradeOrderItem!]!, $paymentProposal: PaymentItem!) {
    createBuyOrder(spaceId: $spaceId, tradeItems: $tradeItems, paymentProposal: $paymentProposal) {
        trade {
            ...TradeFragment
        }
    }
}
"#;

const CANCEL_ORDER: &str = r#"
mutation CancelOrder($spaceId: String!, $tradeId: String!) {
    cancelOrder(spaceId: $spaceId, tradeId: $tradeId) {
        trade {
            ...TradeFragment
        }
    }
}
"#;

// Shared by both trade mutations.
const TRADE_FRAGMENT: &str = r#"
fragment TradeFragment on Trade {
    id
    tradeId
    state
    createdAt
    expiresAt
    failures
    paymentProposal {
        price
    }
}
"#;
