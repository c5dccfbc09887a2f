//! `sol!` bindings for the file-proof and pledge proxy contracts.

use alloy_sol_types::sol;

sol! {
    /// Aggregate KZG opening as the contract carries it: the quotient
    /// commitment in `(X.hi, X.lo, Y.hi, Y.lo)` limbs plus the claimed value.
    struct ProofInfo {
        bytes32[4] h;
        bytes32 value;
    }

    /// Network schedule and pledge parameters.
    struct Setting {
        uint64 chalSum;
        uint64 interval;
        uint64 period;
        uint64 respondTime;
        uint256 subPledge;
    }

    #[sol(rpc)]
    interface IFileProof {
        event AddFile(
            address indexed account,
            bytes32[4] etag,
            uint256 start,
            uint256 end,
            uint64 size,
            uint64 price
        );
        event SubmitProof(
            address indexed submitter,
            bytes32 rnd,
            bytes32[4] cn,
            ProofInfo pn,
            uint256 last,
            uint256 profit
        );
        event ChallengeRes(
            address indexed submitter,
            address indexed challenger,
            uint256 last,
            bool res
        );

        function getSettingInfo() external view returns (Setting memory info);
        function getLast() external view returns (uint256 last);
        function getFinalExpire() external view returns (uint256 finalExpire);
        function getFilesAmount() external view returns (uint256 amount);
        function generateRnd() external;
        function getRndRawBytes() external view returns (bytes32 rnd);
        function addFile(
            bytes32[4] etag,
            uint64 size,
            uint256 start,
            uint256 end,
            bytes signature
        ) external;
        function submitAggregationProof(bytes32 rnd, bytes32[4] cn, ProofInfo pn) external;
        function challengeCn(address submitter, uint8 index) external;
        function challengePn(address submitter) external;
        function responseChallenge(bytes32[4][10] dividedCn, bool isFinal) external;
        function endChallenge(address submitter) external;
        function getChallengeInfo(address submitter)
            external
            view
            returns (uint8 status, uint8 chalIndex, bytes32[4][10] dividedCn);
        function isSubmitterWinner(address submitter) external view returns (bool winner);
        function isSubmitter(address account) external view returns (bool ok);
        function beSubmitter() external;
    }

    #[sol(rpc)]
    interface IPledge {
        event Penalize(
            address indexed from,
            address indexed to,
            uint256 rewardAmount,
            uint256 foundationAmount
        );

        function pledge(uint256 amount) external;
        function getPledgeBalance(address account) external view returns (uint256 balance);
    }
}
