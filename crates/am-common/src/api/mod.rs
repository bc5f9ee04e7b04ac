//! Request and response bodies shared by the HTTP layer.

pub mod match_request;
pub mod match_response;
pub mod profile_request;

pub use match_request::{GenerateMatchesRequest, MatchStatusRequest, RankedQuery, ScoreCandidateRequest};
pub use match_response::{
    GenerateMatchesResponse, GenerateStatus, MatchesResponse, RankedMatchesResponse,
    ScoreCandidateResponse,
};
pub use profile_request::{AvailabilitySlotInput, CompleteQuizRequest, ResourcesRequest};
