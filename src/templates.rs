//! Prompt templates handed to the parameter extractor.
//!
//! Placeholders use `{{key}}` and are filled by [`crate::runtime::compose_context`].

pub const CHECK_BALANCE_TEMPLATE: &str = r#"
You need to help determine which token and chain to use for checking a token balance.

First, review the recent messages from the conversation:

<recent_messages>
{{recentMessages}}
</recent_messages>

Here's a list of supported chains:
<supported_chains>
{{supportedChains}}
</supported_chains>

Use the user's message: "{{userMessage}}" to determine:
1. Which token to check
2. Which chain to check

If the user doesn't specify a chain, try to infer it from the token, or default to "{{defaultChain}}".
If the user names a token instead of giving an address, use these known addresses:
{{knownTokens}}

Output JSON with "chain" and "tokenAddress" fields.
"#;

pub const SWAP_ICY_TO_BTC_TEMPLATE: &str = r#"
You are an AI assistant helping to extract parameters for an ICY to BTC swap.

First, review the recent messages from the conversation:

<recent_messages>
{{recentMessages}}
</recent_messages>

The user wants to swap ICY tokens to BTC on {{swapChain}}.

Extract the following information from the user's message:
1. The Bitcoin address (btcAddress) where they want to receive BTC
2. The amount of ICY tokens (icyAmount) they want to swap

Respond with a JSON object in the following format:
{
  "btcAddress": "bitcoin address extracted from the message",
  "icyAmount": "amount of ICY tokens to swap as a string"
}

For Bitcoin addresses there is no reasonable default - the user must provide one.
If the ICY amount is not specified, default to "1".

Example user messages and corresponding outputs:
User: "Swap 10 ICY to my BTC address bc1qxy2kgdygjrsqtzq2n0yrf2493p83kkfjhx0wlh"
Output: {"btcAddress": "bc1qxy2kgdygjrsqtzq2n0yrf2493p83kkfjhx0wlh", "icyAmount": "10"}

User: "Exchange 5.5 ICY tokens for Bitcoin at 3J98t1WpEZ73CNmQviecrnyiWrnqRhWNLy"
Output: {"btcAddress": "3J98t1WpEZ73CNmQviecrnyiWrnqRhWNLy", "icyAmount": "5.5"}

User: "swap 20 icy to btc address tb1qf06am7xd4tpmnuuw92rgtr48jzq84vr3ykp9hd"
Output: {"btcAddress": "tb1qf06am7xd4tpmnuuw92rgtr48jzq84vr3ykp9hd", "icyAmount": "20"}

User message to extract information from:
{{userMessage}}
"#;
