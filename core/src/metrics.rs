//! Minimum, maximum and average of a metric over an event or a team's
//! seasons.
//!
//! Aggregations always fetch fresh data: they present no ETag and leave the
//! entity's cache token untouched. A team's OPR-family metrics need one
//! OPR table per event attended; those are gathered concurrently.

use tracing::debug;

use crate::client::Client;
use crate::error::ApiError;
use crate::fanout::{gather_years, scatter_gather, Years};
use crate::transport::Transport;
use crate::types::event::event_path;
use crate::types::team::team_path;
use crate::types::{Event, Match, Oprs, Team};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    /// Alliance score of a match.
    MatchScore,
    /// Offensive power rating.
    Opr,
    /// Defensive power rating.
    Dpr,
    /// Calculated contribution to winning margin.
    Ccwm,
}

impl Metric {
    pub fn name(&self) -> &'static str {
        match self {
            Metric::MatchScore => "match score",
            Metric::Opr => "OPR",
            Metric::Dpr => "DPR",
            Metric::Ccwm => "CCWM",
        }
    }

    pub fn is_opr_family(&self) -> bool {
        !matches!(self, Metric::MatchScore)
    }
}

/// Where a minimum or maximum was found.
#[derive(Debug, Clone, PartialEq)]
pub enum Extremum {
    /// For [`Event`]: red plus blue score. For [`Team`]: the team's
    /// alliance score.
    Match { score: i32, record: Match },
    /// The team holding an event's extreme OPR-family value.
    Team { value: f64, team: Team },
    /// The event where a team posted its extreme OPR-family value.
    Event { value: f64, event: Event },
}

#[derive(Debug, Clone, Copy)]
enum Pick {
    Min,
    Max,
}

/// First item with the smallest (or largest) value.
fn select<T>(items: impl IntoIterator<Item = (f64, T)>, pick: Pick) -> Option<(f64, T)> {
    let items = items.into_iter();
    match pick {
        Pick::Min => items.min_by(|a, b| a.0.total_cmp(&b.0)),
        Pick::Max => items.min_by(|a, b| b.0.total_cmp(&a.0)),
    }
}

pub(crate) fn mean(values: impl IntoIterator<Item = f64>, what: &str) -> Result<f64, ApiError> {
    let (sum, count) = values
        .into_iter()
        .fold((0.0, 0usize), |(sum, count), value| (sum + value, count + 1));
    if count == 0 {
        return Err(ApiError::NoData(what.to_string()));
    }
    Ok(sum / count as f64)
}

impl Event {
    pub async fn min<T: Transport>(&self, client: &Client<T>, metric: Metric) -> Result<Extremum, ApiError> {
        self.extremum(client, metric, Pick::Min).await
    }

    pub async fn max<T: Transport>(&self, client: &Client<T>, metric: Metric) -> Result<Extremum, ApiError> {
        self.extremum(client, metric, Pick::Max).await
    }

    /// Mean alliance score over played matches, or the mean OPR-family value.
    pub async fn average<T: Transport>(&self, client: &Client<T>, metric: Metric) -> Result<f64, ApiError> {
        if metric.is_opr_family() {
            return self.fresh_oprs(client).await?.average(metric);
        }
        let matches = self.fresh_matches(client).await?;
        let scores = matches
            .iter()
            .filter_map(|m| m.alliances.as_ref())
            .flat_map(|a| [a.red.played_score(), a.blue.played_score()])
            .flatten()
            .map(f64::from);
        mean(scores, metric.name())
    }

    async fn extremum<T: Transport>(&self, client: &Client<T>, metric: Metric, pick: Pick) -> Result<Extremum, ApiError> {
        if metric.is_opr_family() {
            let oprs = self.fresh_oprs(client).await?;
            let mut values: Vec<(f64, &String)> =
                oprs.values(metric)?.iter().map(|(key, value)| (*value, key)).collect();
            // Ties go to the lowest team key.
            values.sort_by(|a, b| a.1.cmp(b.1));
            let (value, key) = select(values, pick).ok_or_else(|| ApiError::NoData(metric.name().to_string()))?;
            return Ok(Extremum::Team {
                value,
                team: Team::new(key.as_str()),
            });
        }

        let matches = self.fresh_matches(client).await?;
        let scored = matches
            .into_iter()
            .filter_map(|m| m.total_score().map(|score| (f64::from(score), (score, m))));
        let (_, (score, record)) = select(scored, pick).ok_or_else(|| ApiError::NoData(metric.name().to_string()))?;
        Ok(Extremum::Match { score, record })
    }

    async fn fresh_matches<T: Transport>(&self, client: &Client<T>) -> Result<Vec<Match>, ApiError> {
        let path = event_path(&self.key, "matches");
        Ok(client.session().get_as(&path, None).await?.data)
    }

    async fn fresh_oprs<T: Transport>(&self, client: &Client<T>) -> Result<Oprs, ApiError> {
        let path = event_path(&self.key, "oprs");
        let oprs: Option<Oprs> = client.session().get_as(&path, None).await?.data;
        oprs.ok_or_else(|| ApiError::NoData(format!("OPR table for {}", self.key)))
    }
}

impl Team {
    /// `event_code` narrows match scores to one event and is rejected for
    /// OPR-family metrics.
    pub async fn min<T: Transport>(
        &self,
        client: &Client<T>,
        years: impl Into<Years>,
        metric: Metric,
        event_code: Option<&str>,
    ) -> Result<Extremum, ApiError> {
        self.extremum(client, &years.into(), metric, event_code, Pick::Min).await
    }

    pub async fn max<T: Transport>(
        &self,
        client: &Client<T>,
        years: impl Into<Years>,
        metric: Metric,
        event_code: Option<&str>,
    ) -> Result<Extremum, ApiError> {
        self.extremum(client, &years.into(), metric, event_code, Pick::Max).await
    }

    pub async fn average<T: Transport>(
        &self,
        client: &Client<T>,
        years: impl Into<Years>,
        metric: Metric,
        event_code: Option<&str>,
    ) -> Result<f64, ApiError> {
        let years = years.into();
        if metric.is_opr_family() {
            reject_event_code(metric, event_code)?;
            let values = self.event_values(client, &years, metric).await?;
            return mean(values.into_iter().map(|(value, _)| value), metric.name());
        }
        let scores = self.match_scores(client, &years, event_code).await?;
        mean(scores.into_iter().map(|(score, _)| f64::from(score)), metric.name())
    }

    async fn extremum<T: Transport>(
        &self,
        client: &Client<T>,
        years: &Years,
        metric: Metric,
        event_code: Option<&str>,
        pick: Pick,
    ) -> Result<Extremum, ApiError> {
        let no_data = || ApiError::NoData(metric.name().to_string());
        if metric.is_opr_family() {
            reject_event_code(metric, event_code)?;
            let values = self.event_values(client, years, metric).await?;
            let (value, event_key) = select(values, pick).ok_or_else(no_data)?;
            return Ok(Extremum::Event {
                value,
                event: Event::new(event_key),
            });
        }

        let scores = self.match_scores(client, years, event_code).await?;
        let scored = scores.into_iter().map(|(score, m)| (f64::from(score), (score, m)));
        let (_, (score, record)) = select(scored, pick).ok_or_else(no_data)?;
        Ok(Extremum::Match { score, record })
    }

    /// The team's alliance score in every played match of `years`.
    async fn match_scores<T: Transport>(
        &self,
        client: &Client<T>,
        years: &Years,
        event_code: Option<&str>,
    ) -> Result<Vec<(i32, Match)>, ApiError> {
        let session = client.session();
        let matches = gather_years(years, |year| {
            let path = team_path(&self.key, "matches").param("year", year);
            async move { session.get_as::<Vec<Match>>(&path, None).await }
        })
        .await?
        .data;

        Ok(matches
            .into_iter()
            .filter(|m| {
                event_code.map_or(true, |code| m.event_key.as_deref().is_some_and(|key| key.contains(code)))
            })
            .filter_map(|m| {
                let score = m.alliance_of(self.key.as_str())?.1.played_score()?;
                Some((score, m))
            })
            .collect())
    }

    /// `(value, event key)` for every event of `years` whose OPR table
    /// lists the team.
    async fn event_values<T: Transport>(
        &self,
        client: &Client<T>,
        years: &Years,
        metric: Metric,
    ) -> Result<Vec<(f64, String)>, ApiError> {
        let session = client.session();
        let event_keys = gather_years(years, |year| {
            let path = team_path(&self.key, "events").param("year", year).param("keys", true);
            async move { session.get_as::<Vec<String>>(&path, None).await }
        })
        .await?
        .data;
        debug!(team = %self.key, events = event_keys.len(), metric = metric.name(), "gathering event OPR tables");

        let team_key = self.key.as_str();
        let gathered = scatter_gather(event_keys, |event_key| {
            let path = event_path(&event_key, "oprs");
            async move {
                let fetched = session.get_as::<Option<Oprs>>(&path, None).await?;
                fetched.try_map(|oprs| {
                    let value = match oprs {
                        Some(oprs) => oprs.values(metric)?.get(team_key).copied(),
                        None => None,
                    };
                    Ok(value.map(|value| (value, event_key)).into_iter().collect::<Vec<_>>())
                })
            }
        })
        .await?;
        Ok(gathered.data)
    }
}

fn reject_event_code(metric: Metric, event_code: Option<&str>) -> Result<(), ApiError> {
    match event_code {
        Some(code) => Err(ApiError::InvalidArgument(format!(
            "event code {code:?} cannot be combined with {}",
            metric.name()
        ))),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};

    use super::*;
    use crate::testing::{stub_client, StubTransport};

    fn played(key: &str, red: (i32, [&str; 3]), blue: (i32, [&str; 3])) -> Value {
        json!({
            "key": key,
            "event_key": key.split('_').next(),
            "alliances": {
                "red": {"score": red.0, "team_keys": red.1},
                "blue": {"score": blue.0, "team_keys": blue.1}
            }
        })
    }

    fn event_matches() -> Value {
        json!([
            played("2022iri_qm1", (50, ["frc1", "frc2", "frc3"]), (70, ["frc4", "frc5", "frc6"])),
            played("2022iri_qm2", (20, ["frc1", "frc4", "frc7"]), (30, ["frc2", "frc5", "frc8"])),
            played("2022iri_qm3", (90, ["frc3", "frc6", "frc9"]), (110, ["frc1", "frc7", "frc8"])),
            {"key": "2022iri_qm4", "alliances": {"red": {"score": -1}, "blue": {"score": -1}}}
        ])
    }

    #[tokio::test]
    async fn event_match_score_extremes_use_total_score() {
        let client = stub_client(StubTransport::new().get("event/2022iri/matches", event_matches()));
        let event = Event::new("2022iri");

        match event.min(&client, Metric::MatchScore).await.unwrap() {
            Extremum::Match { score, record } => {
                assert_eq!(score, 50);
                assert_eq!(record.key, "2022iri_qm2");
            }
            other => panic!("unexpected {other:?}"),
        }
        match event.max(&client, Metric::MatchScore).await.unwrap() {
            Extremum::Match { score, .. } => assert_eq!(score, 200),
            other => panic!("unexpected {other:?}"),
        }
        let average = event.average(&client, Metric::MatchScore).await.unwrap();
        assert!((average - 370.0 / 6.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn event_opr_extremes_name_the_team() {
        let oprs = json!({
            "oprs": {"frc1": 12.5, "frc2": 40.25, "frc3": 3.0},
            "dprs": {"frc1": 1.0},
            "ccwms": {}
        });
        let client = stub_client(StubTransport::new().get("event/2022iri/oprs", oprs));
        let event = Event::new("2022iri");

        assert_eq!(
            event.max(&client, Metric::Opr).await.unwrap(),
            Extremum::Team { value: 40.25, team: Team::new(2) }
        );
        assert!(matches!(
            event.min(&client, Metric::Ccwm).await,
            Err(ApiError::NoData(_))
        ));
        assert_eq!(event.average(&client, Metric::Dpr).await.unwrap(), 1.0);
    }

    #[tokio::test]
    async fn event_opr_ties_go_to_the_lowest_team_key() {
        let oprs = json!({"oprs": {"frc971": 50.0, "frc1114": 50.0, "frc2056": 50.0, "frc33": 10.0}});
        let client = stub_client(StubTransport::new().get("event/2022iri/oprs", oprs));
        let event = Event::new("2022iri");

        for _ in 0..5 {
            assert_eq!(
                event.max(&client, Metric::Opr).await.unwrap(),
                Extremum::Team { value: 50.0, team: Team::new(1114) }
            );
        }
    }

    #[tokio::test]
    async fn team_match_scores_use_own_alliance_and_event_filter() {
        let stub = StubTransport::new().get("team/frc1/matches/2022", event_matches());
        let client = stub_client(stub);
        let team = Team::new(1);

        match team.max(&client, 2022, Metric::MatchScore, None).await.unwrap() {
            Extremum::Match { score, record } => {
                assert_eq!(score, 110);
                assert_eq!(record.key, "2022iri_qm3");
            }
            other => panic!("unexpected {other:?}"),
        }
        let average = team.average(&client, 2022, Metric::MatchScore, Some("iri")).await.unwrap();
        assert!((average - 60.0).abs() < 1e-9);
        assert!(matches!(
            team.min(&client, 2022, Metric::MatchScore, Some("cmptx")).await,
            Err(ApiError::NoData(_))
        ));
    }

    #[tokio::test]
    async fn team_opr_metrics_reject_event_code_before_io() {
        let client = stub_client(StubTransport::new());
        let team = Team::new(4099);
        let err = team
            .average(&client, 2022, Metric::Opr, Some("iri"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidArgument(_)));
        assert_eq!(client.session().transport().calls(), 0);
    }

    #[tokio::test]
    async fn team_opr_gathers_every_event_table() {
        let stub = StubTransport::new()
            .get("team/frc4099/events/2021/keys", json!(["2021va"]))
            .get("team/frc4099/events/2022/keys", json!(["2022chcmp", "2022iri"]))
            .get("event/2021va/oprs", json!({"oprs": {"frc4099": 20.0}}))
            .get("event/2022chcmp/oprs", json!({"oprs": {"frc4099": 35.0}}))
            .get("event/2022iri/oprs", json!({"oprs": {"frc254": 60.0}}));
        let client = stub_client(stub);
        let team = Team::new(4099);

        match team.max(&client, 2021..2023, Metric::Opr, None).await.unwrap() {
            Extremum::Event { value, event } => {
                assert_eq!(value, 35.0);
                assert_eq!(event.key, "2022chcmp");
            }
            other => panic!("unexpected {other:?}"),
        }
        let average = team.average(&client, 2021..2023, Metric::Opr, None).await.unwrap();
        assert!((average - 27.5).abs() < 1e-9);
    }

    #[test]
    fn select_prefers_the_first_of_equal_values() {
        let items = vec![(1.0, "a"), (3.0, "b"), (3.0, "c"), (1.0, "d")];
        assert_eq!(select(items.clone(), Pick::Min), Some((1.0, "a")));
        assert_eq!(select(items, Pick::Max), Some((3.0, "b")));
        assert!(mean(Vec::new(), "OPR").is_err());
    }
}
