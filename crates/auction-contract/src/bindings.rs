//! Solidity bindings of the auction contract.

use alloy_sol_types::sol;

sol! {
	interface IAuctionContract {
		function createAuction(string name, uint256 startingPrice, string description, uint256 duration) external;
		function placeBid(uint256 auctionId) external payable;
		function endAuction(uint256 auctionId) external;
		function withdraw() external;

		function getAuction(uint256 auctionId) external view returns (
			address seller,
			string name,
			string description,
			uint256 startingPrice,
			uint256 highestBid,
			address highestBidder,
			uint256 endTime,
			bool ended
		);
		function getUserBids(address user) external view returns (uint256[] memory);
		function auctionCounter() external view returns (uint256);
		function getPendingReturn(address user) external view returns (uint256);
		function owner() external view returns (address);
		function stopped() external view returns (bool);
	}
}
