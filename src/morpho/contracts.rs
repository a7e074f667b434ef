//! Morpho contracts
//!
//! Bindings for the Morpho-Compound and Morpho-AaveV2 deployments: the
//! `Morpho` entry points, the read-only `Lens`, the price oracles of the
//! underlying pools and the ERC-4626 supply vaults.
//!
//! Lens functions returning several values keep the contracts' own ordering:
//! market totals are matched-first, user balances are pool-first.

use alloy::sol;

sol! {
    #[derive(Debug)]
    #[sol(rpc)]
    interface ICompoundLens {
        function getTotalSupply() external view returns (uint256 p2pSupplyAmount, uint256 poolSupplyAmount, uint256 totalSupplyAmount);
        function getTotalBorrow() external view returns (uint256 p2pBorrowAmount, uint256 poolBorrowAmount, uint256 totalBorrowAmount);

        function getTotalMarketSupply(address _poolToken) external view returns (uint256 p2pSupplyAmount, uint256 poolSupplyAmount);
        function getTotalMarketBorrow(address _poolToken) external view returns (uint256 p2pBorrowAmount, uint256 poolBorrowAmount);

        function getCurrentSupplyBalanceInOf(address _poolToken, address _user) external view returns (uint256 balanceOnPool, uint256 balanceInP2P, uint256 totalBalance);
        function getCurrentBorrowBalanceInOf(address _poolToken, address _user) external view returns (uint256 balanceOnPool, uint256 balanceInP2P, uint256 totalBalance);

        function getAverageSupplyRatePerBlock(address _poolToken) external view returns (uint256 avgSupplyRatePerBlock, uint256 p2pSupplyAmount, uint256 poolSupplyAmount);
        function getAverageBorrowRatePerBlock(address _poolToken) external view returns (uint256 avgBorrowRatePerBlock, uint256 p2pBorrowAmount, uint256 poolBorrowAmount);

        function getCurrentUserSupplyRatePerBlock(address _poolToken, address _user) external view returns (uint256);
        function getCurrentUserBorrowRatePerBlock(address _poolToken, address _user) external view returns (uint256);

        function getNextUserSupplyRatePerBlock(address _poolToken, address _user, uint256 _amount) external view returns (uint256 nextSupplyRatePerBlock, uint256 balanceOnPool, uint256 balanceInP2P, uint256 totalBalance);
        function getNextUserBorrowRatePerBlock(address _poolToken, address _user, uint256 _amount) external view returns (uint256 nextBorrowRatePerBlock, uint256 balanceOnPool, uint256 balanceInP2P, uint256 totalBalance);

        function getUserUnclaimedRewards(address[] calldata _poolTokens, address _user) external view returns (uint256 unclaimedRewards);
    }
}

sol! {
    #[derive(Debug)]
    #[sol(rpc)]
    interface ICompoundMorpho {
        function supply(address _poolToken, address _onBehalf, uint256 _amount) external;
        function supply(address _poolToken, address _onBehalf, uint256 _amount, uint256 _maxGasForMatching) external;
        function withdraw(address _poolToken, uint256 _amount) external;
        function borrow(address _poolToken, uint256 _amount) external;
        function repay(address _poolToken, address _onBehalf, uint256 _amount) external;
        function claimRewards(address[] calldata _cTokenAddresses, bool _tradeForMorphoToken) external returns (uint256 claimedAmount);
    }
}

sol! {
    /// Compound's `UniswapAnchoredView`.
    #[derive(Debug)]
    #[sol(rpc)]
    interface ICompoundOracle {
        function getUnderlyingPrice(address cToken) external view returns (uint256);
    }
}

sol! {
    #[derive(Debug)]
    #[sol(rpc)]
    interface IAaveV2Lens {
        function getTotalSupply() external view returns (uint256 p2pSupplyAmount, uint256 poolSupplyAmount, uint256 totalSupplyAmount);
        function getTotalBorrow() external view returns (uint256 p2pBorrowAmount, uint256 poolBorrowAmount, uint256 totalBorrowAmount);

        function getTotalMarketSupply(address _poolToken) external view returns (uint256 p2pSupplyAmount, uint256 poolSupplyAmount);
        function getTotalMarketBorrow(address _poolToken) external view returns (uint256 p2pBorrowAmount, uint256 poolBorrowAmount);

        function getCurrentSupplyBalanceInOf(address _poolToken, address _user) external view returns (uint256 balanceOnPool, uint256 balanceInP2P, uint256 totalBalance);
        function getCurrentBorrowBalanceInOf(address _poolToken, address _user) external view returns (uint256 balanceOnPool, uint256 balanceInP2P, uint256 totalBalance);

        function getAverageSupplyRatePerYear(address _poolToken) external view returns (uint256 avgSupplyRatePerYear, uint256 p2pSupplyAmount, uint256 poolSupplyAmount);
        function getAverageBorrowRatePerYear(address _poolToken) external view returns (uint256 avgBorrowRatePerYear, uint256 p2pBorrowAmount, uint256 poolBorrowAmount);

        function getCurrentUserSupplyRatePerYear(address _poolToken, address _user) external view returns (uint256);
        function getCurrentUserBorrowRatePerYear(address _poolToken, address _user) external view returns (uint256);

        function getNextUserSupplyRatePerYear(address _poolToken, address _user, uint256 _amount) external view returns (uint256 nextSupplyRatePerYear, uint256 balanceOnPool, uint256 balanceInP2P, uint256 totalBalance);
        function getNextUserBorrowRatePerYear(address _poolToken, address _user, uint256 _amount) external view returns (uint256 nextBorrowRatePerYear, uint256 balanceOnPool, uint256 balanceInP2P, uint256 totalBalance);
    }
}

sol! {
    #[derive(Debug)]
    #[sol(rpc)]
    interface IAaveV2Morpho {
        function supply(address _poolToken, address _onBehalf, uint256 _amount) external;
        function withdraw(address _poolToken, uint256 _amount) external;
        function borrow(address _poolToken, uint256 _amount) external;
        function repay(address _poolToken, address _onBehalf, uint256 _amount) external;
        function claimRewards(address[] calldata _assets, bool _tradeForMorphoToken) external returns (uint256 claimedAmount);
    }
}

sol! {
    #[derive(Debug)]
    #[sol(rpc)]
    interface IAaveOracle {
        function getAssetPrice(address asset) external view returns (uint256);
    }
}

sol! {
    /// ERC-4626 supply vault over a Morpho supply position.
    #[derive(Debug)]
    #[sol(rpc)]
    interface ISupplyVault {
        function asset() external view returns (address);
        function balanceOf(address owner) external view returns (uint256);
        function totalAssets() external view returns (uint256);
        function convertToAssets(uint256 shares) external view returns (uint256);
        function deposit(uint256 assets, address receiver) external returns (uint256 shares);
        function withdraw(uint256 assets, address receiver, address owner) external returns (uint256 shares);

        function userRewards(address _user) external view returns (uint128 index, uint128 unclaimed);
        function claimRewards(address _user) external returns (uint256 rewardsAmount);
    }
}

sol! {
    /// Supply vault that swaps its rewards back into the underlying.
    #[derive(Debug)]
    #[sol(rpc)]
    interface ISupplyHarvestVault {
        function harvest() external returns (uint256 rewardsAmount, uint256 rewardsFee);
    }
}
