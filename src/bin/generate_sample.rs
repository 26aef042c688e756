use std::fs::File;
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

const HEADER: [&str; 9] = [
    "DIAG_PRINC",
    "descricao_cid",
    "TOTAL_OCORRENCIAS",
    "valor_total",
    "total_feminino",
    "total_masculino",
    "total_ignorado",
    "idade_media",
    "sexo_majoritario",
];

/// (code, description, typical age, female share)
const DIAGNOSES: &[(&str, &str, f64, f64)] = &[
    ("A09", "Diarreia e gastroenterite de origem infecciosa presumivel", 18.0, 0.5),
    ("B34", "Doenca por virus de localizacao nao especificada", 6.0, 0.48),
    ("C34", "Neoplasia maligna dos bronquios e dos pulmoes", 66.0, 0.42),
    ("C50", "Neoplasia maligna da mama", 57.0, 0.99),
    ("C61", "Neoplasia maligna da prostata", 71.0, 0.0),
    ("E11", "Diabetes mellitus nao-insulino-dependente", 62.0, 0.55),
    ("F10", "Transtornos mentais devidos ao uso de alcool", 45.0, 0.15),
    ("F20", "Esquizofrenia", 38.0, 0.35),
    ("I10", "Hipertensao essencial", 64.0, 0.58),
    ("I21", "Infarto agudo do miocardio", 63.0, 0.36),
    ("I50", "Insuficiencia cardiaca", 74.0, 0.5),
    ("I64", "Acidente vascular cerebral nao especificado", 70.0, 0.48),
    ("J06", "Infeccoes agudas das vias aereas superiores", 4.0, 0.46),
    ("J18", "Pneumonia por microorganismo nao especificado", 58.0, 0.47),
    ("J21", "Bronquiolite aguda", 1.0, 0.44),
    ("J44", "Doenca pulmonar obstrutiva cronica", 69.0, 0.45),
    ("J45", "Asma", 11.0, 0.5),
    ("K35", "Apendicite aguda", 21.0, 0.45),
    ("K40", "Hernia inguinal", 48.0, 0.12),
    ("K80", "Colelitiase", 47.0, 0.75),
    ("N39", "Outros transtornos do trato urinario", 52.0, 0.66),
    ("O80", "Parto unico espontaneo", 24.0, 1.0),
    ("O82", "Parto unico por cesariana", 27.0, 1.0),
    ("P07", "Transtornos relacionados com a gestacao de curta duracao", 0.1, 0.49),
    ("P59", "Ictericia neonatal", 0.05, 0.47),
    ("S06", "Traumatismo intracraniano", 36.0, 0.25),
    ("S72", "Fratura do femur", 77.0, 0.68),
    ("T14", "Traumatismo de regiao nao especificada do corpo", 23.0, 0.3),
    ("Z51", "Outros cuidados medicos", 56.0, 0.52),
    ("Z38", "Nascidos vivos segundo o local de nascimento", 0.0, 0.49),
    ("A41", "Outras septicemias", 61.0, 0.47),
    ("A46", "Erisipela", 55.0, 0.52),
    ("B20", "Doenca pelo HIV resultando em doencas infecciosas e parasitarias", 42.0, 0.38),
    ("C18", "Neoplasia maligna do colon", 64.0, 0.51),
    ("C16", "Neoplasia maligna do estomago", 65.0, 0.37),
    ("C53", "Neoplasia maligna do colo do utero", 49.0, 1.0),
    ("D25", "Leiomioma do utero", 44.0, 1.0),
    ("E86", "Deplecao de volume", 68.0, 0.53),
    ("F32", "Episodios depressivos", 39.0, 0.68),
    ("F19", "Transtornos mentais devidos ao uso de multiplas drogas", 29.0, 0.2),
    ("G40", "Epilepsia", 22.0, 0.46),
    ("G45", "Acidentes vasculares cerebrais isquemicos transitorios", 67.0, 0.5),
    ("I20", "Angina pectoris", 63.0, 0.4),
    ("I48", "Flutter e fibrilacao atrial", 72.0, 0.49),
    ("I70", "Aterosclerose", 70.0, 0.37),
    ("I83", "Varizes dos membros inferiores", 50.0, 0.78),
    ("J15", "Pneumonia bacteriana nao classificada em outra parte", 60.0, 0.45),
    ("J20", "Bronquite aguda", 9.0, 0.47),
    ("K56", "Ileo paralitico e obstrucao intestinal sem hernia", 57.0, 0.5),
    ("K57", "Doenca diverticular do intestino", 63.0, 0.55),
    ("K85", "Pancreatite aguda", 49.0, 0.45),
    ("L03", "Celulite", 45.0, 0.43),
    ("M51", "Outros transtornos de discos intervertebrais", 49.0, 0.45),
    ("N18", "Doenca renal cronica", 58.0, 0.43),
    ("N20", "Calculose do rim e do ureter", 46.0, 0.48),
    ("O47", "Falso trabalho de parto", 24.0, 1.0),
    ("P22", "Desconforto respiratorio do recem-nascido", 0.02, 0.42),
    ("Q21", "Malformacoes congenitas dos septos cardiacos", 2.0, 0.52),
    ("S52", "Fratura do antebraco", 19.0, 0.38),
    ("S82", "Fratura da perna incluindo tornozelo", 38.0, 0.41),
];

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn range(&mut self, lo: f64, hi: f64) -> f64 {
        lo + (hi - lo) * self.next_f64()
    }
}

struct Row {
    code: String,
    description: String,
    occurrences: i64,
    value: f64,
    female: i64,
    male: i64,
    unknown: i64,
    age: f64,
    majority: String,
}

fn generate_rows(rng: &mut SimpleRng) -> Vec<Row> {
    DIAGNOSES
        .iter()
        .map(|&(code, description, typical_age, female_share)| {
            let occurrences = rng.range(50.0, 12_000.0).round() as i64;
            let unknown = (occurrences as f64 * rng.range(0.0, 0.01)).round() as i64;
            let female = ((occurrences - unknown) as f64 * female_share).round() as i64;
            let male = occurrences - unknown - female;
            let cost_per_stay = rng.range(300.0, 9_000.0);
            let age = (typical_age + rng.range(-2.0, 2.0)).max(0.0);

            let majority = if unknown > female && unknown > male {
                "Ignorado"
            } else if female >= male {
                "Feminino"
            } else {
                "Masculino"
            };

            Row {
                code: code.to_string(),
                description: description.to_string(),
                occurrences,
                value: (occurrences as f64 * cost_per_stay * 100.0).round() / 100.0,
                female,
                male,
                unknown,
                age: (age * 100.0).round() / 100.0,
                majority: majority.to_string(),
            }
        })
        .collect()
}

fn write_csv(path: &str, rows: &[Row]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).with_context(|| format!("creating {path}"))?;
    writer.write_record(HEADER)?;
    for r in rows {
        writer.write_record([
            r.code.clone(),
            r.description.clone(),
            r.occurrences.to_string(),
            r.value.to_string(),
            r.female.to_string(),
            r.male.to_string(),
            r.unknown.to_string(),
            r.age.to_string(),
            r.majority.clone(),
        ])?;
    }
    writer.flush().context("flushing CSV")?;
    Ok(())
}

fn write_parquet(path: &str, rows: &[Row]) -> Result<()> {
    let text = |name: &str| Field::new(name, DataType::Utf8, false);
    let int = |name: &str| Field::new(name, DataType::Int64, false);
    let float = |name: &str| Field::new(name, DataType::Float64, false);

    let schema = Arc::new(Schema::new(vec![
        text(HEADER[0]),
        text(HEADER[1]),
        int(HEADER[2]),
        float(HEADER[3]),
        int(HEADER[4]),
        int(HEADER[5]),
        int(HEADER[6]),
        float(HEADER[7]),
        text(HEADER[8]),
    ]));

    let strings = |f: fn(&Row) -> &str| StringArray::from(rows.iter().map(f).collect::<Vec<_>>());
    let ints = |f: fn(&Row) -> i64| Int64Array::from(rows.iter().map(f).collect::<Vec<_>>());
    let floats = |f: fn(&Row) -> f64| Float64Array::from(rows.iter().map(f).collect::<Vec<_>>());

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(strings(|r| r.code.as_str())),
            Arc::new(strings(|r| r.description.as_str())),
            Arc::new(ints(|r| r.occurrences)),
            Arc::new(floats(|r| r.value)),
            Arc::new(ints(|r| r.female)),
            Arc::new(ints(|r| r.male)),
            Arc::new(ints(|r| r.unknown)),
            Arc::new(floats(|r| r.age)),
            Arc::new(strings(|r| r.majority.as_str())),
        ],
    )
    .context("building record batch")?;

    let file = File::create(path).with_context(|| format!("creating {path}"))?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating Parquet writer")?;
    writer.write(&batch).context("writing batch")?;
    writer.close().context("closing Parquet writer")?;
    Ok(())
}

fn main() -> Result<()> {
    let mut rng = SimpleRng::new(2024);
    let rows = generate_rows(&mut rng);

    let csv_path = "dados_sus_processados.csv";
    let parquet_path = "dados_sus_processados.parquet";
    write_csv(csv_path, &rows)?;
    write_parquet(parquet_path, &rows)?;

    println!(
        "Wrote {} diagnosis rows to {csv_path} and {parquet_path}",
        rows.len()
    );
    Ok(())
}
