use serde::{Deserialize, Deserializer};
use std::io::Read;

use super::super::domain::{
    BenchmarkRow, CompensationModel, Fte, MonthlyProductivity, PercentileBands, Provider,
    ProviderId, ProviderStatus, TierScheduleId,
};
use super::normalizer::{normalize_cell, parse_number};
use super::ImportError;

const MONTH_COLUMNS: [&str; 12] = [
    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
];

fn reader_for<R: Read>(reader: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader)
}

/// Deserializes every data row, pairing it with its 1-based line number.
fn rows<R: Read, T>(reader: R) -> Result<Vec<(u64, T)>, ImportError>
where
    T: for<'de> Deserialize<'de>,
{
    let mut csv_reader = reader_for(reader);
    let headers = csv_reader.headers()?.clone();
    let mut rows = Vec::new();

    for record in csv_reader.records() {
        let record = record?;
        let line = record.position().map(|position| position.line()).unwrap_or(0);
        let row: T = record.deserialize(Some(&headers))?;
        rows.push((line, row));
    }

    Ok(rows)
}

pub(crate) fn parse_providers<R: Read>(reader: R) -> Result<Vec<Provider>, ImportError> {
    rows::<_, ProviderRow>(reader)?
        .into_iter()
        .map(|(line, row)| row.into_provider().map_err(|message| ImportError::row(line, message)))
        .collect()
}

pub(crate) fn parse_benchmarks<R: Read>(reader: R) -> Result<Vec<BenchmarkRow>, ImportError> {
    rows::<_, BenchmarkCsvRow>(reader)?
        .into_iter()
        .map(|(line, row)| row.into_benchmark().map_err(|message| ImportError::row(line, message)))
        .collect()
}

pub(crate) fn parse_productivity<R: Read>(
    reader: R,
) -> Result<Vec<MonthlyProductivity>, ImportError> {
    let mut entries = Vec::new();
    for (line, row) in rows::<_, WrvuRow>(reader)? {
        entries.extend(
            row.into_entries()
                .map_err(|message| ImportError::row(line, message))?,
        );
    }
    Ok(entries)
}

#[derive(Debug, Deserialize)]
struct ProviderRow {
    employee_id: String,
    name: String,
    specialty: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    fte: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    clinical_fte: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    non_clinical_fte: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    annual_wrvu_target: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    base_salary: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    compensation_model: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    conversion_factor: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    tier_schedule_id: Option<String>,
}

impl ProviderRow {
    fn into_provider(self) -> Result<Provider, String> {
        let model_label = self.compensation_model.unwrap_or_default();
        let compensation_model = CompensationModel::parse(&model_label)
            .ok_or_else(|| format!("unknown compensation model '{model_label}'"))?;

        Ok(Provider {
            provider_id: ProviderId(normalize_cell(&self.employee_id)),
            name: normalize_cell(&self.name),
            specialty: normalize_cell(&self.specialty),
            fte: Fte {
                total: optional_number(self.fte.as_deref())?.unwrap_or(1.0),
                clinical: optional_number(self.clinical_fte.as_deref())?,
                non_clinical: optional_number(self.non_clinical_fte.as_deref())?,
            },
            annual_wrvu_target: number_or_zero(self.annual_wrvu_target.as_deref())?,
            base_salary: number_or_zero(self.base_salary.as_deref())?,
            compensation_model,
            conversion_factor: number_or_zero(self.conversion_factor.as_deref())?,
            tier_schedule_id: self
                .tier_schedule_id
                .map(|id| TierScheduleId(normalize_cell(&id))),
            status: ProviderStatus::Active,
            termination_date: None,
        })
    }
}

#[derive(Debug, Deserialize)]
struct BenchmarkCsvRow {
    specialty: String,
    p25_tcc: Option<String>,
    p50_tcc: Option<String>,
    p75_tcc: Option<String>,
    p90_tcc: Option<String>,
    p25_wrvu: Option<String>,
    p50_wrvu: Option<String>,
    p75_wrvu: Option<String>,
    p90_wrvu: Option<String>,
    p25_cf: Option<String>,
    p50_cf: Option<String>,
    p75_cf: Option<String>,
    p90_cf: Option<String>,
}

impl BenchmarkCsvRow {
    fn into_benchmark(self) -> Result<BenchmarkRow, String> {
        let bands = |p25: &Option<String>,
                     p50: &Option<String>,
                     p75: &Option<String>,
                     p90: &Option<String>|
         -> Result<PercentileBands, String> {
            Ok(PercentileBands::new(
                number_or_zero(p25.as_deref())?,
                number_or_zero(p50.as_deref())?,
                number_or_zero(p75.as_deref())?,
                number_or_zero(p90.as_deref())?,
            ))
        };

        Ok(BenchmarkRow {
            specialty: normalize_cell(&self.specialty),
            total_compensation: bands(&self.p25_tcc, &self.p50_tcc, &self.p75_tcc, &self.p90_tcc)?,
            wrvus: bands(&self.p25_wrvu, &self.p50_wrvu, &self.p75_wrvu, &self.p90_wrvu)?,
            conversion_factor: bands(&self.p25_cf, &self.p50_cf, &self.p75_cf, &self.p90_cf)?,
        })
    }
}

#[derive(Debug, Deserialize)]
struct WrvuRow {
    employee_id: String,
    year: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    jan: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    feb: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    mar: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    apr: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    may: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    jun: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    jul: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    aug: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    sep: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    oct: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    nov: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    dec: Option<String>,
}

impl WrvuRow {
    fn into_entries(self) -> Result<Vec<MonthlyProductivity>, String> {
        let provider_id = ProviderId(normalize_cell(&self.employee_id));
        if provider_id.0.is_empty() {
            return Err("employee_id is required".to_string());
        }
        let year: i32 = normalize_cell(&self.year)
            .parse()
            .map_err(|_| format!("'{}' is not a valid year", self.year.trim()))?;

        let cells = [
            self.jan, self.feb, self.mar, self.apr, self.may, self.jun, self.jul, self.aug,
            self.sep, self.oct, self.nov, self.dec,
        ];

        let mut entries = Vec::new();
        for (index, cell) in cells.iter().enumerate() {
            let Some(wrvus) = parse_number(cell.as_deref().unwrap_or_default())
                .map_err(|err| format!("{}: {err}", MONTH_COLUMNS[index]))?
            else {
                continue;
            };
            entries.push(MonthlyProductivity {
                provider_id: provider_id.clone(),
                year,
                month: index as u8 + 1,
                wrvus,
            });
        }
        Ok(entries)
    }
}

fn optional_number(value: Option<&str>) -> Result<Option<f64>, String> {
    match value {
        Some(raw) => parse_number(raw),
        None => Ok(None),
    }
}

fn number_or_zero(value: Option<&str>) -> Result<f64, String> {
    Ok(optional_number(value)?.unwrap_or(0.0))
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}
