use anyhow::{bail, Context, Result};
use clap::{Args as ClapArgs, Parser as ClapParser, Subcommand};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use ffcam_core::config::{CameraConfig, CameraConfigReader};
use ffcam_core::script::opcode::{mnemonic, OpcodeDesc, OP_RESTART, OP_SET_WAIT, RESTART_MARKER};
use ffcam_core::script::{ArgPatcher, Cursor, Dialect, Simulation, Simulator};
use ffcam_core::{HostMemory, TraceFlags};

use std::io::Write;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inst {
    address: u32,
    opcode: u8,
    mnemonic: String,
    operands: Vec<String>,
    /// Operand stored at half resolution, if any.
    doubled: Option<u8>,
    terminal: bool,
}

impl Inst {
    pub fn from_desc(address: u32, opcode: u8, desc: &OpcodeDesc, operands: Vec<String>) -> Self {
        // F5 is handled by the interpreter itself, its only argument is a duration
        let doubled = if opcode == OP_SET_WAIT {
            Some(0)
        } else {
            desc.doubled_arg
        };
        Self {
            address,
            opcode,
            mnemonic: mnemonic(opcode).to_string(),
            operands,
            doubled,
            terminal: desc.terminal,
        }
    }

    pub fn from_restart(address: u32, marker: Option<u8>) -> Self {
        Self {
            address,
            opcode: OP_RESTART,
            mnemonic: mnemonic(OP_RESTART).to_string(),
            operands: marker.map(|m| m.to_string()).into_iter().collect(),
            doubled: None,
            terminal: false,
        }
    }

    pub fn from_unknown(address: u32, opcode: u8) -> Self {
        Self {
            address,
            opcode,
            mnemonic: "db".to_string(),
            operands: vec![format!("0x{:02x}", opcode)],
            doubled: None,
            terminal: false,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CameraProject {
    input: PathBuf,
    dialect: Dialect,
    offset: u32,
    listing_file: PathBuf,
}

/// Linear listing of a raw camera script dump.
pub struct Disassembler {
    input: PathBuf,
    bytes: Vec<u8>,
    dialect: Dialect,
    offset: usize,
    cursor: usize,
    insts: Vec<Inst>,
}

impl Disassembler {
    pub fn new(path: impl AsRef<Path>, dialect: Dialect, offset: u32) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)
            .with_context(|| format!("failed to read camera script dump {}", path.display()))?;
        Self::from_bytes(path, bytes, dialect, offset)
    }

    pub fn from_bytes(
        input: impl Into<PathBuf>,
        bytes: Vec<u8>,
        dialect: Dialect,
        offset: u32,
    ) -> Result<Self> {
        let offset = offset as usize;
        if offset > bytes.len() {
            bail!("offset 0x{:x} is past the end of the dump ({} bytes)", offset, bytes.len());
        }
        Ok(Self {
            input: input.into(),
            bytes,
            dialect,
            offset,
            cursor: offset,
            insts: Vec::new(),
        })
    }

    pub fn get_pc(&self) -> usize {
        self.cursor
    }

    pub fn insts(&self) -> &[Inst] {
        &self.insts
    }

    /// Argument bytes starting at `start`, cut short at the end of the dump.
    fn operands(&self, start: usize, count: usize) -> Vec<String> {
        self.bytes
            .iter()
            .skip(start)
            .take(count)
            .map(|b| b.to_string())
            .collect()
    }

    fn restart(&mut self) {
        let addr = self.get_pc();
        let marker = self.bytes.get(addr + 1).copied().filter(|b| *b == RESTART_MARKER);
        self.cursor += 1 + marker.map_or(0, |_| 1);
        self.insts.push(Inst::from_restart(addr as u32, marker));
    }

    fn disassemble_opcode(&mut self) -> Result<()> {
        let addr = self.get_pc();
        let Some(&opcode) = self.bytes.get(addr) else {
            bail!("pc 0x{:x} is past the end of the dump", addr);
        };

        if opcode == OP_RESTART {
            self.restart();
            return Ok(());
        }

        match self.dialect.table().get(opcode) {
            Some(desc) => {
                let count = desc.arg_len.max(0) as usize;
                let operands = self.operands(addr + 1, count);
                if operands.len() < count {
                    log::warn!(
                        "opcode 0x{:02x} at 0x{:x} truncated: {} of {} arguments",
                        opcode,
                        addr,
                        operands.len(),
                        count
                    );
                }
                self.cursor += 1 + count;
                self.insts.push(Inst::from_desc(addr as u32, opcode, desc, operands));
            }
            None => {
                self.cursor += 1;
                self.insts.push(Inst::from_unknown(addr as u32, opcode));
                log::warn!("unknown {} opcode: 0x{:02x} at 0x{:x}", self.dialect, opcode, addr);
            }
        }

        Ok(())
    }

    pub fn disassemble(&mut self) -> Result<()> {
        while self.get_pc() < self.bytes.len() {
            self.disassemble_opcode()?;
        }

        Ok(())
    }

    pub fn write_insts(&self, path: impl AsRef<Path>) -> Result<()> {
        let output = path.as_ref();
        if !output.exists() {
            std::fs::create_dir_all(output)?;
        }

        let listing_path = output.join("listing.yaml");
        let mut writer = std::fs::File::create(listing_path)?;
        serde_yaml::to_writer(&mut writer, &self.insts)?;

        let project = CameraProject {
            input: self.input.clone(),
            dialect: self.dialect,
            offset: self.offset as u32,
            listing_file: PathBuf::from("listing.yaml"),
        };

        let toml_project = output.join("project.toml");
        let mut writer = std::fs::File::create(toml_project)?;
        let serialized_string = toml::to_string_pretty(&project)?;
        writer.write_all(serialized_string.as_bytes())?;

        Ok(())
    }
}

/// Run the simulator once per frame, carrying the cursor over.
#[allow(clippy::too_many_arguments)]
pub fn simulate_frames(
    bytes: &mut [u8],
    base: u32,
    offset: u32,
    len: Option<usize>,
    dialect: Dialect,
    frames: usize,
    patcher: &mut ArgPatcher,
    config: &CameraConfig,
    trace: TraceFlags,
) -> Result<Vec<Simulation>> {
    let mut mem = HostMemory::new(base, bytes);
    let start = base
        .checked_add(offset)
        .context("script offset overflows the address space")?;
    let mut script = mem.view(start)?;
    if let Some(len) = len {
        script = script.truncated(len);
    }
    let simulator = Simulator::new(dialect.table())
        .with_trace(trace)
        .with_step_limit(config.step_limit);

    let mut cursor = Cursor::START;
    let mut runs = Vec::with_capacity(frames);
    for _ in 0..frames {
        let sim = simulator.run(&mut mem, script, cursor, patcher);
        cursor = sim.cursor;
        runs.push(sim);
    }
    Ok(runs)
}

fn parse_number(s: &str) -> std::result::Result<u32, String> {
    let s = s.trim();
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => s.parse(),
    };
    parsed.map_err(|e| format!("invalid number {:?}: {}", s, e))
}

#[derive(ClapArgs, Debug)]
struct ScriptArgs {
    #[arg(short, long, required = true)]
    input: PathBuf,

    #[arg(short, long, default_value = "5c3fd5")]
    dialect: Dialect,

    /// Offset of the script inside the dump
    #[arg(long, default_value = "0", value_parser = parse_number)]
    offset: u32,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write a yaml listing of a camera script dump
    List {
        #[command(flatten)]
        script: ScriptArgs,

        #[arg(short, long, required = true)]
        output: PathBuf,
    },
    /// Simulate a camera script dump frame by frame
    Simulate {
        #[command(flatten)]
        script: ScriptArgs,

        #[arg(short, long, default_value_t = 1)]
        frames: usize,

        /// Script length, defaults to the rest of the dump
        #[arg(long)]
        len: Option<usize>,

        /// Address the dump is loaded at
        #[arg(long, default_value = "0", value_parser = parse_number)]
        base: u32,

        /// Leave half-resolution arguments untouched
        #[arg(long)]
        no_patch: bool,
    },
}

/// Battle camera script listing and simulation
#[derive(ClapParser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Camera config (json)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable the battle camera trace category
    #[arg(long)]
    trace: bool,

    #[command(subcommand)]
    command: Command,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config = match &args.config {
        Some(path) => CameraConfigReader::read_json(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => CameraConfig::default(),
    };
    if let Some(logger_config) = &config.logger_config {
        logger_config.init().context("failed to initialize logger")?;
    }

    let mut trace = config.effective_trace();
    if args.trace {
        trace = trace.merge(TraceFlags::battle_camera());
    }

    match args.command {
        Command::List { script, output } => {
            let mut disassembler = Disassembler::new(&script.input, script.dialect, script.offset)?;
            disassembler.disassemble()?;
            disassembler.write_insts(output)?;
        }
        Command::Simulate {
            script,
            frames,
            len,
            base,
            no_patch,
        } => {
            let mut bytes = std::fs::read(&script.input).with_context(|| {
                format!("failed to read camera script dump {}", script.input.display())
            })?;
            let mut patcher = if no_patch || !config.patch_script_args {
                ArgPatcher::disabled()
            } else {
                ArgPatcher::new()
            };
            let runs = simulate_frames(
                &mut bytes,
                base,
                script.offset,
                len,
                script.dialect,
                frames,
                &mut patcher,
                &config,
                trace,
            )?;

            for (frame, sim) in runs.iter().enumerate() {
                println!(
                    "frame {:>4}: position {:>4}, frames to wait {:>3}, {:?} after {} steps",
                    frame, sim.cursor.position, sim.cursor.frames_to_wait, sim.halt, sim.steps
                );
                if !sim.halt.is_clean() {
                    log::warn!("frame {} stopped early: {:?}", frame, sim.halt);
                }
            }
            if !patcher.is_enabled() {
                println!("argument patching disabled");
            }
            println!("{} patched arguments", patcher.patched_count());
            for addr in patcher.patched_addresses() {
                println!("  0x{:08x}", addr);
            }
        }
    }

    Ok(())
}
