//! Stubs de Entrada de Interrupção
//!
//! Funções naked instaladas na IDT. Cada stub normaliza o frame:
//! vetores sem error code empilham um zero sintético, depois o número do
//! vetor, depois todos os registradores de uso geral na ordem que o
//! `InterruptContext` espera. O trampolim em Rust recebe o ponteiro da
//! pilha como primeiro argumento.
//!
//! Vetores com error code do hardware: 8 (#DF), 10 (#TS), 11 (#NP),
//! 12 (#SS), 13 (#GP), 14 (#PF), 17 (#AC), 21 (#CP).

use core::ptr::{addr_of, addr_of_mut};

use crate::arch::x86_64::idt::{Idt, IDT};

macro_rules! stub_no_err {
    ($name:ident, $vector:literal) => {
        #[unsafe(naked)]
        pub extern "C" fn $name() {
            core::arch::naked_asm!(
                "push 0", // error code sintético
                concat!("push ", stringify!($vector)),
                "push rbp",
                "push r15",
                "push r14",
                "push r13",
                "push r12",
                "push r11",
                "push r10",
                "push r9",
                "push r8",
                "push rdi",
                "push rsi",
                "push rdx",
                "push rcx",
                "push rbx",
                "push rax",
                "mov rdi, rsp",
                "cld",
                "call {handler}",
                "pop rax",
                "pop rbx",
                "pop rcx",
                "pop rdx",
                "pop rsi",
                "pop rdi",
                "pop r8",
                "pop r9",
                "pop r10",
                "pop r11",
                "pop r12",
                "pop r13",
                "pop r14",
                "pop r15",
                "pop rbp",
                "add rsp, 16", // descarta vetor + error code
                "iretq",
                handler = sym crate::interrupts::trampoline,
            );
        }
    };
}

macro_rules! stub_err {
    ($name:ident, $vector:literal) => {
        #[unsafe(naked)]
        pub extern "C" fn $name() {
            core::arch::naked_asm!(
                // error code já empilhado pelo hardware
                concat!("push ", stringify!($vector)),
                "push rbp",
                "push r15",
                "push r14",
                "push r13",
                "push r12",
                "push r11",
                "push r10",
                "push r9",
                "push r8",
                "push rdi",
                "push rsi",
                "push rdx",
                "push rcx",
                "push rbx",
                "push rax",
                "mov rdi, rsp",
                "cld",
                "call {handler}",
                "pop rax",
                "pop rbx",
                "pop rcx",
                "pop rdx",
                "pop rsi",
                "pop rdi",
                "pop r8",
                "pop r9",
                "pop r10",
                "pop r11",
                "pop r12",
                "pop r13",
                "pop r14",
                "pop r15",
                "pop rbp",
                "add rsp, 16", // descarta vetor + error code
                "iretq",
                handler = sym crate::interrupts::trampoline,
            );
        }
    };
}

stub_no_err!(stub_0, 0);
stub_no_err!(stub_1, 1);
stub_no_err!(stub_2, 2);
stub_no_err!(stub_3, 3);
stub_no_err!(stub_4, 4);
stub_no_err!(stub_5, 5);
stub_no_err!(stub_6, 6);
stub_no_err!(stub_7, 7);
stub_err!(stub_8, 8);
stub_no_err!(stub_9, 9);
stub_err!(stub_10, 10);
stub_err!(stub_11, 11);
stub_err!(stub_12, 12);
stub_err!(stub_13, 13);
stub_err!(stub_14, 14);
stub_no_err!(stub_15, 15);
stub_no_err!(stub_16, 16);
stub_err!(stub_17, 17);
stub_no_err!(stub_18, 18);
stub_no_err!(stub_19, 19);
stub_no_err!(stub_20, 20);
stub_err!(stub_21, 21);
stub_no_err!(stub_22, 22);
stub_no_err!(stub_23, 23);
stub_no_err!(stub_24, 24);
stub_no_err!(stub_25, 25);
stub_no_err!(stub_26, 26);
stub_no_err!(stub_27, 27);
stub_no_err!(stub_28, 28);
stub_no_err!(stub_29, 29);
stub_no_err!(stub_30, 30);
stub_no_err!(stub_31, 31);
stub_no_err!(stub_32, 32);
stub_no_err!(stub_33, 33);
stub_no_err!(stub_34, 34);
stub_no_err!(stub_35, 35);
stub_no_err!(stub_36, 36);
stub_no_err!(stub_37, 37);
stub_no_err!(stub_38, 38);
stub_no_err!(stub_39, 39);
stub_no_err!(stub_40, 40);
stub_no_err!(stub_41, 41);
stub_no_err!(stub_42, 42);
stub_no_err!(stub_43, 43);
stub_no_err!(stub_44, 44);
stub_no_err!(stub_45, 45);
stub_no_err!(stub_46, 46);
stub_no_err!(stub_47, 47);
stub_no_err!(stub_48, 48);
stub_no_err!(stub_49, 49);
stub_no_err!(stub_50, 50);
stub_no_err!(stub_51, 51);
stub_no_err!(stub_52, 52);
stub_no_err!(stub_53, 53);
stub_no_err!(stub_54, 54);
stub_no_err!(stub_55, 55);
stub_no_err!(stub_56, 56);
stub_no_err!(stub_57, 57);
stub_no_err!(stub_58, 58);
stub_no_err!(stub_59, 59);
stub_no_err!(stub_60, 60);
stub_no_err!(stub_61, 61);
stub_no_err!(stub_62, 62);
stub_no_err!(stub_63, 63);
stub_no_err!(stub_64, 64);
stub_no_err!(stub_65, 65);
stub_no_err!(stub_66, 66);
stub_no_err!(stub_67, 67);
stub_no_err!(stub_68, 68);
stub_no_err!(stub_69, 69);
stub_no_err!(stub_70, 70);
stub_no_err!(stub_71, 71);
stub_no_err!(stub_72, 72);
stub_no_err!(stub_73, 73);
stub_no_err!(stub_74, 74);
stub_no_err!(stub_75, 75);
stub_no_err!(stub_76, 76);
stub_no_err!(stub_77, 77);
stub_no_err!(stub_78, 78);
stub_no_err!(stub_79, 79);
stub_no_err!(stub_80, 80);
stub_no_err!(stub_81, 81);
stub_no_err!(stub_82, 82);
stub_no_err!(stub_83, 83);
stub_no_err!(stub_84, 84);
stub_no_err!(stub_85, 85);
stub_no_err!(stub_86, 86);
stub_no_err!(stub_87, 87);
stub_no_err!(stub_88, 88);
stub_no_err!(stub_89, 89);
stub_no_err!(stub_90, 90);
stub_no_err!(stub_91, 91);
stub_no_err!(stub_92, 92);
stub_no_err!(stub_93, 93);
stub_no_err!(stub_94, 94);
stub_no_err!(stub_95, 95);
stub_no_err!(stub_96, 96);
stub_no_err!(stub_97, 97);
stub_no_err!(stub_98, 98);
stub_no_err!(stub_99, 99);
stub_no_err!(stub_100, 100);
stub_no_err!(stub_101, 101);
stub_no_err!(stub_102, 102);
stub_no_err!(stub_103, 103);
stub_no_err!(stub_104, 104);
stub_no_err!(stub_105, 105);
stub_no_err!(stub_106, 106);
stub_no_err!(stub_107, 107);
stub_no_err!(stub_108, 108);
stub_no_err!(stub_109, 109);
stub_no_err!(stub_110, 110);
stub_no_err!(stub_111, 111);
stub_no_err!(stub_112, 112);
stub_no_err!(stub_113, 113);
stub_no_err!(stub_114, 114);
stub_no_err!(stub_115, 115);
stub_no_err!(stub_116, 116);
stub_no_err!(stub_117, 117);
stub_no_err!(stub_118, 118);
stub_no_err!(stub_119, 119);
stub_no_err!(stub_120, 120);
stub_no_err!(stub_121, 121);
stub_no_err!(stub_122, 122);
stub_no_err!(stub_123, 123);
stub_no_err!(stub_124, 124);
stub_no_err!(stub_125, 125);
stub_no_err!(stub_126, 126);
stub_no_err!(stub_127, 127);
stub_no_err!(stub_128, 128);
stub_no_err!(stub_129, 129);
stub_no_err!(stub_130, 130);
stub_no_err!(stub_131, 131);
stub_no_err!(stub_132, 132);
stub_no_err!(stub_133, 133);
stub_no_err!(stub_134, 134);
stub_no_err!(stub_135, 135);
stub_no_err!(stub_136, 136);
stub_no_err!(stub_137, 137);
stub_no_err!(stub_138, 138);
stub_no_err!(stub_139, 139);
stub_no_err!(stub_140, 140);
stub_no_err!(stub_141, 141);
stub_no_err!(stub_142, 142);
stub_no_err!(stub_143, 143);
stub_no_err!(stub_144, 144);
stub_no_err!(stub_145, 145);
stub_no_err!(stub_146, 146);
stub_no_err!(stub_147, 147);
stub_no_err!(stub_148, 148);
stub_no_err!(stub_149, 149);
stub_no_err!(stub_150, 150);
stub_no_err!(stub_151, 151);
stub_no_err!(stub_152, 152);
stub_no_err!(stub_153, 153);
stub_no_err!(stub_154, 154);
stub_no_err!(stub_155, 155);
stub_no_err!(stub_156, 156);
stub_no_err!(stub_157, 157);
stub_no_err!(stub_158, 158);
stub_no_err!(stub_159, 159);
stub_no_err!(stub_160, 160);
stub_no_err!(stub_161, 161);
stub_no_err!(stub_162, 162);
stub_no_err!(stub_163, 163);
stub_no_err!(stub_164, 164);
stub_no_err!(stub_165, 165);
stub_no_err!(stub_166, 166);
stub_no_err!(stub_167, 167);
stub_no_err!(stub_168, 168);
stub_no_err!(stub_169, 169);
stub_no_err!(stub_170, 170);
stub_no_err!(stub_171, 171);
stub_no_err!(stub_172, 172);
stub_no_err!(stub_173, 173);
stub_no_err!(stub_174, 174);
stub_no_err!(stub_175, 175);
stub_no_err!(stub_176, 176);
stub_no_err!(stub_177, 177);
stub_no_err!(stub_178, 178);
stub_no_err!(stub_179, 179);
stub_no_err!(stub_180, 180);
stub_no_err!(stub_181, 181);
stub_no_err!(stub_182, 182);
stub_no_err!(stub_183, 183);
stub_no_err!(stub_184, 184);
stub_no_err!(stub_185, 185);
stub_no_err!(stub_186, 186);
stub_no_err!(stub_187, 187);
stub_no_err!(stub_188, 188);
stub_no_err!(stub_189, 189);
stub_no_err!(stub_190, 190);
stub_no_err!(stub_191, 191);
stub_no_err!(stub_192, 192);
stub_no_err!(stub_193, 193);
stub_no_err!(stub_194, 194);
stub_no_err!(stub_195, 195);
stub_no_err!(stub_196, 196);
stub_no_err!(stub_197, 197);
stub_no_err!(stub_198, 198);
stub_no_err!(stub_199, 199);
stub_no_err!(stub_200, 200);
stub_no_err!(stub_201, 201);
stub_no_err!(stub_202, 202);
stub_no_err!(stub_203, 203);
stub_no_err!(stub_204, 204);
stub_no_err!(stub_205, 205);
stub_no_err!(stub_206, 206);
stub_no_err!(stub_207, 207);
stub_no_err!(stub_208, 208);
stub_no_err!(stub_209, 209);
stub_no_err!(stub_210, 210);
stub_no_err!(stub_211, 211);
stub_no_err!(stub_212, 212);
stub_no_err!(stub_213, 213);
stub_no_err!(stub_214, 214);
stub_no_err!(stub_215, 215);
stub_no_err!(stub_216, 216);
stub_no_err!(stub_217, 217);
stub_no_err!(stub_218, 218);
stub_no_err!(stub_219, 219);
stub_no_err!(stub_220, 220);
stub_no_err!(stub_221, 221);
stub_no_err!(stub_222, 222);
stub_no_err!(stub_223, 223);
stub_no_err!(stub_224, 224);
stub_no_err!(stub_225, 225);
stub_no_err!(stub_226, 226);
stub_no_err!(stub_227, 227);
stub_no_err!(stub_228, 228);
stub_no_err!(stub_229, 229);
stub_no_err!(stub_230, 230);
stub_no_err!(stub_231, 231);
stub_no_err!(stub_232, 232);
stub_no_err!(stub_233, 233);
stub_no_err!(stub_234, 234);
stub_no_err!(stub_235, 235);
stub_no_err!(stub_236, 236);
stub_no_err!(stub_237, 237);
stub_no_err!(stub_238, 238);
stub_no_err!(stub_239, 239);
stub_no_err!(stub_240, 240);
stub_no_err!(stub_241, 241);
stub_no_err!(stub_242, 242);
stub_no_err!(stub_243, 243);
stub_no_err!(stub_244, 244);
stub_no_err!(stub_245, 245);
stub_no_err!(stub_246, 246);
stub_no_err!(stub_247, 247);
stub_no_err!(stub_248, 248);
stub_no_err!(stub_249, 249);
stub_no_err!(stub_250, 250);
stub_no_err!(stub_251, 251);
stub_no_err!(stub_252, 252);
stub_no_err!(stub_253, 253);
stub_no_err!(stub_254, 254);
stub_no_err!(stub_255, 255);

/// Preenche os 256 vetores da IDT e a carrega na CPU atual.
///
/// # Safety
///
/// Chamar uma vez por core, durante o boot, antes de habilitar
/// interrupções. A escrita na IDT global não é sincronizada.
pub unsafe fn init_idt() {
    {
        let idt: &mut Idt = &mut *addr_of_mut!(IDT);
        idt.set_handler(0, stub_0 as usize as u64);
        idt.set_handler(1, stub_1 as usize as u64);
        idt.set_handler(2, stub_2 as usize as u64);
        idt.set_handler(3, stub_3 as usize as u64);
        idt.set_handler(4, stub_4 as usize as u64);
        idt.set_handler(5, stub_5 as usize as u64);
        idt.set_handler(6, stub_6 as usize as u64);
        idt.set_handler(7, stub_7 as usize as u64);
        idt.set_handler(8, stub_8 as usize as u64);
        idt.set_handler(9, stub_9 as usize as u64);
        idt.set_handler(10, stub_10 as usize as u64);
        idt.set_handler(11, stub_11 as usize as u64);
        idt.set_handler(12, stub_12 as usize as u64);
        idt.set_handler(13, stub_13 as usize as u64);
        idt.set_handler(14, stub_14 as usize as u64);
        idt.set_handler(15, stub_15 as usize as u64);
        idt.set_handler(16, stub_16 as usize as u64);
        idt.set_handler(17, stub_17 as usize as u64);
        idt.set_handler(18, stub_18 as usize as u64);
        idt.set_handler(19, stub_19 as usize as u64);
        idt.set_handler(20, stub_20 as usize as u64);
        idt.set_handler(21, stub_21 as usize as u64);
        idt.set_handler(22, stub_22 as usize as u64);
        idt.set_handler(23, stub_23 as usize as u64);
        idt.set_handler(24, stub_24 as usize as u64);
        idt.set_handler(25, stub_25 as usize as u64);
        idt.set_handler(26, stub_26 as usize as u64);
        idt.set_handler(27, stub_27 as usize as u64);
        idt.set_handler(28, stub_28 as usize as u64);
        idt.set_handler(29, stub_29 as usize as u64);
        idt.set_handler(30, stub_30 as usize as u64);
        idt.set_handler(31, stub_31 as usize as u64);
        idt.set_handler(32, stub_32 as usize as u64);
        idt.set_handler(33, stub_33 as usize as u64);
        idt.set_handler(34, stub_34 as usize as u64);
        idt.set_handler(35, stub_35 as usize as u64);
        idt.set_handler(36, stub_36 as usize as u64);
        idt.set_handler(37, stub_37 as usize as u64);
        idt.set_handler(38, stub_38 as usize as u64);
        idt.set_handler(39, stub_39 as usize as u64);
        idt.set_handler(40, stub_40 as usize as u64);
        idt.set_handler(41, stub_41 as usize as u64);
        idt.set_handler(42, stub_42 as usize as u64);
        idt.set_handler(43, stub_43 as usize as u64);
        idt.set_handler(44, stub_44 as usize as u64);
        idt.set_handler(45, stub_45 as usize as u64);
        idt.set_handler(46, stub_46 as usize as u64);
        idt.set_handler(47, stub_47 as usize as u64);
        idt.set_handler(48, stub_48 as usize as u64);
        idt.set_handler(49, stub_49 as usize as u64);
        idt.set_handler(50, stub_50 as usize as u64);
        idt.set_handler(51, stub_51 as usize as u64);
        idt.set_handler(52, stub_52 as usize as u64);
        idt.set_handler(53, stub_53 as usize as u64);
        idt.set_handler(54, stub_54 as usize as u64);
        idt.set_handler(55, stub_55 as usize as u64);
        idt.set_handler(56, stub_56 as usize as u64);
        idt.set_handler(57, stub_57 as usize as u64);
        idt.set_handler(58, stub_58 as usize as u64);
        idt.set_handler(59, stub_59 as usize as u64);
        idt.set_handler(60, stub_60 as usize as u64);
        idt.set_handler(61, stub_61 as usize as u64);
        idt.set_handler(62, stub_62 as usize as u64);
        idt.set_handler(63, stub_63 as usize as u64);
        idt.set_handler(64, stub_64 as usize as u64);
        idt.set_handler(65, stub_65 as usize as u64);
        idt.set_handler(66, stub_66 as usize as u64);
        idt.set_handler(67, stub_67 as usize as u64);
        idt.set_handler(68, stub_68 as usize as u64);
        idt.set_handler(69, stub_69 as usize as u64);
        idt.set_handler(70, stub_70 as usize as u64);
        idt.set_handler(71, stub_71 as usize as u64);
        idt.set_handler(72, stub_72 as usize as u64);
        idt.set_handler(73, stub_73 as usize as u64);
        idt.set_handler(74, stub_74 as usize as u64);
        idt.set_handler(75, stub_75 as usize as u64);
        idt.set_handler(76, stub_76 as usize as u64);
        idt.set_handler(77, stub_77 as usize as u64);
        idt.set_handler(78, stub_78 as usize as u64);
        idt.set_handler(79, stub_79 as usize as u64);
        idt.set_handler(80, stub_80 as usize as u64);
        idt.set_handler(81, stub_81 as usize as u64);
        idt.set_handler(82, stub_82 as usize as u64);
        idt.set_handler(83, stub_83 as usize as u64);
        idt.set_handler(84, stub_84 as usize as u64);
        idt.set_handler(85, stub_85 as usize as u64);
        idt.set_handler(86, stub_86 as usize as u64);
        idt.set_handler(87, stub_87 as usize as u64);
        idt.set_handler(88, stub_88 as usize as u64);
        idt.set_handler(89, stub_89 as usize as u64);
        idt.set_handler(90, stub_90 as usize as u64);
        idt.set_handler(91, stub_91 as usize as u64);
        idt.set_handler(92, stub_92 as usize as u64);
        idt.set_handler(93, stub_93 as usize as u64);
        idt.set_handler(94, stub_94 as usize as u64);
        idt.set_handler(95, stub_95 as usize as u64);
        idt.set_handler(96, stub_96 as usize as u64);
        idt.set_handler(97, stub_97 as usize as u64);
        idt.set_handler(98, stub_98 as usize as u64);
        idt.set_handler(99, stub_99 as usize as u64);
        idt.set_handler(100, stub_100 as usize as u64);
        idt.set_handler(101, stub_101 as usize as u64);
        idt.set_handler(102, stub_102 as usize as u64);
        idt.set_handler(103, stub_103 as usize as u64);
        idt.set_handler(104, stub_104 as usize as u64);
        idt.set_handler(105, stub_105 as usize as u64);
        idt.set_handler(106, stub_106 as usize as u64);
        idt.set_handler(107, stub_107 as usize as u64);
        idt.set_handler(108, stub_108 as usize as u64);
        idt.set_handler(109, stub_109 as usize as u64);
        idt.set_handler(110, stub_110 as usize as u64);
        idt.set_handler(111, stub_111 as usize as u64);
        idt.set_handler(112, stub_112 as usize as u64);
        idt.set_handler(113, stub_113 as usize as u64);
        idt.set_handler(114, stub_114 as usize as u64);
        idt.set_handler(115, stub_115 as usize as u64);
        idt.set_handler(116, stub_116 as usize as u64);
        idt.set_handler(117, stub_117 as usize as u64);
        idt.set_handler(118, stub_118 as usize as u64);
        idt.set_handler(119, stub_119 as usize as u64);
        idt.set_handler(120, stub_120 as usize as u64);
        idt.set_handler(121, stub_121 as usize as u64);
        idt.set_handler(122, stub_122 as usize as u64);
        idt.set_handler(123, stub_123 as usize as u64);
        idt.set_handler(124, stub_124 as usize as u64);
        idt.set_handler(125, stub_125 as usize as u64);
        idt.set_handler(126, stub_126 as usize as u64);
        idt.set_handler(127, stub_127 as usize as u64);
        idt.set_handler(128, stub_128 as usize as u64);
        idt.set_handler(129, stub_129 as usize as u64);
        idt.set_handler(130, stub_130 as usize as u64);
        idt.set_handler(131, stub_131 as usize as u64);
        idt.set_handler(132, stub_132 as usize as u64);
        idt.set_handler(133, stub_133 as usize as u64);
        idt.set_handler(134, stub_134 as usize as u64);
        idt.set_handler(135, stub_135 as usize as u64);
        idt.set_handler(136, stub_136 as usize as u64);
        idt.set_handler(137, stub_137 as usize as u64);
        idt.set_handler(138, stub_138 as usize as u64);
        idt.set_handler(139, stub_139 as usize as u64);
        idt.set_handler(140, stub_140 as usize as u64);
        idt.set_handler(141, stub_141 as usize as u64);
        idt.set_handler(142, stub_142 as usize as u64);
        idt.set_handler(143, stub_143 as usize as u64);
        idt.set_handler(144, stub_144 as usize as u64);
        idt.set_handler(145, stub_145 as usize as u64);
        idt.set_handler(146, stub_146 as usize as u64);
        idt.set_handler(147, stub_147 as usize as u64);
        idt.set_handler(148, stub_148 as usize as u64);
        idt.set_handler(149, stub_149 as usize as u64);
        idt.set_handler(150, stub_150 as usize as u64);
        idt.set_handler(151, stub_151 as usize as u64);
        idt.set_handler(152, stub_152 as usize as u64);
        idt.set_handler(153, stub_153 as usize as u64);
        idt.set_handler(154, stub_154 as usize as u64);
        idt.set_handler(155, stub_155 as usize as u64);
        idt.set_handler(156, stub_156 as usize as u64);
        idt.set_handler(157, stub_157 as usize as u64);
        idt.set_handler(158, stub_158 as usize as u64);
        idt.set_handler(159, stub_159 as usize as u64);
        idt.set_handler(160, stub_160 as usize as u64);
        idt.set_handler(161, stub_161 as usize as u64);
        idt.set_handler(162, stub_162 as usize as u64);
        idt.set_handler(163, stub_163 as usize as u64);
        idt.set_handler(164, stub_164 as usize as u64);
        idt.set_handler(165, stub_165 as usize as u64);
        idt.set_handler(166, stub_166 as usize as u64);
        idt.set_handler(167, stub_167 as usize as u64);
        idt.set_handler(168, stub_168 as usize as u64);
        idt.set_handler(169, stub_169 as usize as u64);
        idt.set_handler(170, stub_170 as usize as u64);
        idt.set_handler(171, stub_171 as usize as u64);
        idt.set_handler(172, stub_172 as usize as u64);
        idt.set_handler(173, stub_173 as usize as u64);
        idt.set_handler(174, stub_174 as usize as u64);
        idt.set_handler(175, stub_175 as usize as u64);
        idt.set_handler(176, stub_176 as usize as u64);
        idt.set_handler(177, stub_177 as usize as u64);
        idt.set_handler(178, stub_178 as usize as u64);
        idt.set_handler(179, stub_179 as usize as u64);
        idt.set_handler(180, stub_180 as usize as u64);
        idt.set_handler(181, stub_181 as usize as u64);
        idt.set_handler(182, stub_182 as usize as u64);
        idt.set_handler(183, stub_183 as usize as u64);
        idt.set_handler(184, stub_184 as usize as u64);
        idt.set_handler(185, stub_185 as usize as u64);
        idt.set_handler(186, stub_186 as usize as u64);
        idt.set_handler(187, stub_187 as usize as u64);
        idt.set_handler(188, stub_188 as usize as u64);
        idt.set_handler(189, stub_189 as usize as u64);
        idt.set_handler(190, stub_190 as usize as u64);
        idt.set_handler(191, stub_191 as usize as u64);
        idt.set_handler(192, stub_192 as usize as u64);
        idt.set_handler(193, stub_193 as usize as u64);
        idt.set_handler(194, stub_194 as usize as u64);
        idt.set_handler(195, stub_195 as usize as u64);
        idt.set_handler(196, stub_196 as usize as u64);
        idt.set_handler(197, stub_197 as usize as u64);
        idt.set_handler(198, stub_198 as usize as u64);
        idt.set_handler(199, stub_199 as usize as u64);
        idt.set_handler(200, stub_200 as usize as u64);
        idt.set_handler(201, stub_201 as usize as u64);
        idt.set_handler(202, stub_202 as usize as u64);
        idt.set_handler(203, stub_203 as usize as u64);
        idt.set_handler(204, stub_204 as usize as u64);
        idt.set_handler(205, stub_205 as usize as u64);
        idt.set_handler(206, stub_206 as usize as u64);
        idt.set_handler(207, stub_207 as usize as u64);
        idt.set_handler(208, stub_208 as usize as u64);
        idt.set_handler(209, stub_209 as usize as u64);
        idt.set_handler(210, stub_210 as usize as u64);
        idt.set_handler(211, stub_211 as usize as u64);
        idt.set_handler(212, stub_212 as usize as u64);
        idt.set_handler(213, stub_213 as usize as u64);
        idt.set_handler(214, stub_214 as usize as u64);
        idt.set_handler(215, stub_215 as usize as u64);
        idt.set_handler(216, stub_216 as usize as u64);
        idt.set_handler(217, stub_217 as usize as u64);
        idt.set_handler(218, stub_218 as usize as u64);
        idt.set_handler(219, stub_219 as usize as u64);
        idt.set_handler(220, stub_220 as usize as u64);
        idt.set_handler(221, stub_221 as usize as u64);
        idt.set_handler(222, stub_222 as usize as u64);
        idt.set_handler(223, stub_223 as usize as u64);
        idt.set_handler(224, stub_224 as usize as u64);
        idt.set_handler(225, stub_225 as usize as u64);
        idt.set_handler(226, stub_226 as usize as u64);
        idt.set_handler(227, stub_227 as usize as u64);
        idt.set_handler(228, stub_228 as usize as u64);
        idt.set_handler(229, stub_229 as usize as u64);
        idt.set_handler(230, stub_230 as usize as u64);
        idt.set_handler(231, stub_231 as usize as u64);
        idt.set_handler(232, stub_232 as usize as u64);
        idt.set_handler(233, stub_233 as usize as u64);
        idt.set_handler(234, stub_234 as usize as u64);
        idt.set_handler(235, stub_235 as usize as u64);
        idt.set_handler(236, stub_236 as usize as u64);
        idt.set_handler(237, stub_237 as usize as u64);
        idt.set_handler(238, stub_238 as usize as u64);
        idt.set_handler(239, stub_239 as usize as u64);
        idt.set_handler(240, stub_240 as usize as u64);
        idt.set_handler(241, stub_241 as usize as u64);
        idt.set_handler(242, stub_242 as usize as u64);
        idt.set_handler(243, stub_243 as usize as u64);
        idt.set_handler(244, stub_244 as usize as u64);
        idt.set_handler(245, stub_245 as usize as u64);
        idt.set_handler(246, stub_246 as usize as u64);
        idt.set_handler(247, stub_247 as usize as u64);
        idt.set_handler(248, stub_248 as usize as u64);
        idt.set_handler(249, stub_249 as usize as u64);
        idt.set_handler(250, stub_250 as usize as u64);
        idt.set_handler(251, stub_251 as usize as u64);
        idt.set_handler(252, stub_252 as usize as u64);
        idt.set_handler(253, stub_253 as usize as u64);
        idt.set_handler(254, stub_254 as usize as u64);
        idt.set_handler(255, stub_255 as usize as u64);
    }
    let idt: &'static Idt = &*addr_of!(IDT);
    idt.load();
}
