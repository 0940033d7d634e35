pub mod assessment_service;
pub mod attempt_service;
pub mod candidate_service;
pub mod finalization_service;
pub mod publication_service;
pub mod question_service;
pub mod result_service;
pub mod scoring_service;
pub mod stats_service;
pub mod violation_service;
