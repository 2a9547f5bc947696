use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct GenderCount {
    pub gender: String,
    pub count: i64,
}

#[derive(Debug, Serialize)]
pub struct GenderDemographicsResponse {
    pub gender_distribution: Vec<GenderCount>,
}

#[derive(Debug, Serialize)]
pub struct GrowthPoint {
    pub period: String,
    pub count: i64,
}

#[derive(Debug, Serialize)]
pub struct UserGrowthResponse {
    pub timeframe: String,
    pub growth_data: Vec<GrowthPoint>,
}

#[derive(Debug, Serialize)]
pub struct AgeBucketCount {
    pub age_range: String,
    pub count: i64,
}

#[derive(Debug, Serialize)]
pub struct AgeDistributionResponse {
    pub age_distribution: Vec<AgeBucketCount>,
}
