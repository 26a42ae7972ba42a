use rand::RngCore;
use std::fs::File;
use std::io::Write;

fn generate_random_tokens(count: usize) -> Vec<String> {
    let mut rng = rand::thread_rng();
    let mut tokens = Vec::new();
    for _ in 0..count {
        let mut bytes = [0u8; 32];
        rng.fill_bytes(&mut bytes);
        tokens.push(hex::encode(bytes));
    }
    tokens
}

fn validate_tokens(tokens: &[String]) -> bool {
    tokens
        .iter()
        .all(|t| t.len() == 64 && t.chars().all(|c| c.is_ascii_hexdigit()))
}

fn check_duplicates(tokens: &[String]) -> bool {
    let unique_count: std::collections::HashSet<_> = tokens.iter().collect();
    unique_count.len() == tokens.len()
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let count = 16;
    let output_file = "allowlist.csv";

    println!("Generating {} voter tokens...", count);
    let tokens = generate_random_tokens(count);

    if !validate_tokens(&tokens) {
        return Err("Generated invalid tokens".into());
    }

    if !check_duplicates(&tokens) {
        return Err("Generated duplicate tokens".into());
    }

    println!("Writing allowlist to {}...", output_file);
    let mut file = File::create(output_file)?;
    writeln!(file, "email,token")?;
    for (i, token) in tokens.iter().enumerate() {
        writeln!(file, "voter{}@example.com,{}", i, token)?;
    }

    println!("Successfully generated {} entries", count);
    println!("First 5 emails (tokens stay in the file):");
    for i in 0..count.min(5) {
        println!("  {}: voter{}@example.com", i + 1, i);
    }

    println!("\nValidation checks:");
    println!("  ✓ All tokens are valid");
    println!("  ✓ No duplicate tokens found");

    Ok(())
}
