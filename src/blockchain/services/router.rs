// src/blockchain/services/router.rs
//
// Calldata for a Uniswap-V2-style router.

use ethers_core::abi::{decode, ParamType, Token};
use ethers_core::types::{Address, Bytes, U256};

use super::token::encode_call;

pub const GET_AMOUNTS_OUT: &str = "getAmountsOut(uint256,address[])";
pub const SWAP_EXACT_ETH_FOR_TOKENS: &str = "swapExactETHForTokens(uint256,address[],address,uint256)";
pub const SWAP_EXACT_TOKENS_FOR_ETH: &str =
    "swapExactTokensForETH(uint256,uint256,address[],address,uint256)";
pub const SWAP_EXACT_TOKENS_FOR_TOKENS: &str =
    "swapExactTokensForTokens(uint256,uint256,address[],address,uint256)";

fn path_token(path: &[Address]) -> Token {
    Token::Array(path.iter().copied().map(Token::Address).collect())
}

pub fn get_amounts_out_call(amount_in: U256, path: &[Address]) -> Bytes {
    encode_call(GET_AMOUNTS_OUT, vec![Token::Uint(amount_in), path_token(path)])
}

pub fn decode_amounts_out(raw: &[u8]) -> Option<Vec<U256>> {
    let tokens = decode(&[ParamType::Array(Box::new(ParamType::Uint(256)))], raw).ok()?;
    match tokens.into_iter().next()? {
        Token::Array(items) => items.into_iter().map(|t| t.into_uint()).collect(),
        _ => None,
    }
}

pub fn swap_exact_eth_for_tokens_call(amount_out_min: U256, path: &[Address], to: Address, deadline: U256) -> Bytes {
    encode_call(
        SWAP_EXACT_ETH_FOR_TOKENS,
        vec![Token::Uint(amount_out_min), path_token(path), Token::Address(to), Token::Uint(deadline)],
    )
}

pub fn swap_exact_tokens_for_eth_call(
    amount_in: U256,
    amount_out_min: U256,
    path: &[Address],
    to: Address,
    deadline: U256,
) -> Bytes {
    encode_call(
        SWAP_EXACT_TOKENS_FOR_ETH,
        vec![
            Token::Uint(amount_in),
            Token::Uint(amount_out_min),
            path_token(path),
            Token::Address(to),
            Token::Uint(deadline),
        ],
    )
}

pub fn swap_exact_tokens_for_tokens_call(
    amount_in: U256,
    amount_out_min: U256,
    path: &[Address],
    to: Address,
    deadline: U256,
) -> Bytes {
    encode_call(
        SWAP_EXACT_TOKENS_FOR_TOKENS,
        vec![
            Token::Uint(amount_in),
            Token::Uint(amount_out_min),
            path_token(path),
            Token::Address(to),
            Token::Uint(deadline),
        ],
    )
}
