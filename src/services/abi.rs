//! Contract bindings

use alloy::sol;

sol! {
    interface IERC20 {
        function name() external view returns (string);
        function symbol() external view returns (string);
        function decimals() external view returns (uint8);
        function balanceOf(address account) external view returns (uint256);
        function allowance(address owner, address spender) external view returns (uint256);
        function approve(address spender, uint256 amount) external returns (bool);
    }
}

sol! {
    interface IIcyBtcSwap {
        function swap(
            uint256 icyAmount,
            string btcAddress,
            uint256 btcAmount,
            uint256 nonce,
            uint256 deadline,
            bytes signature
        ) external;
    }
}
